//! # Operation Handler Registry
//!
//! Maps `(kind, collection)` pairs to the handler that executes them, with a
//! per-kind wildcard fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::item::{OperationKind, QueueItem};

/// Wildcard collection marker accepted by [`HandlerRegistry::register`]
pub const WILDCARD_COLLECTION: &str = "*";

/// Executes one queued operation against the backend.
///
/// `Ok(true)` means the operation succeeded; `Ok(false)` and `Err` both
/// count as a failed attempt and drive the retry path.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn execute(&self, item: &QueueItem) -> Result<bool>;
}

/// Exact-match plus wildcard-fallback handler lookup
#[derive(Default)]
pub struct HandlerRegistry {
    exact: HashMap<(OperationKind, String), Arc<dyn OperationHandler>>,
    wildcard: HashMap<OperationKind, Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a kind across the given collections.
    ///
    /// `"*"` registers the per-kind wildcard fallback. Re-registering a pair
    /// silently replaces the previous handler.
    pub fn register(
        &mut self,
        kind: OperationKind,
        collections: &[&str],
        handler: Arc<dyn OperationHandler>,
    ) {
        for collection in collections {
            debug!(
                kind = kind.as_str(),
                collection = *collection,
                "Registering operation handler"
            );
            if *collection == WILDCARD_COLLECTION {
                self.wildcard.insert(kind, handler.clone());
            } else {
                self.exact
                    .insert((kind, collection.to_string()), handler.clone());
            }
        }
    }

    /// Remove registrations for a kind across the given collections
    pub fn unregister(&mut self, kind: OperationKind, collections: &[&str]) {
        for collection in collections {
            if *collection == WILDCARD_COLLECTION {
                self.wildcard.remove(&kind);
            } else {
                self.exact.remove(&(kind, collection.to_string()));
            }
        }
    }

    /// Look up a handler: exact match first, then the kind's wildcard
    pub fn resolve(
        &self,
        kind: OperationKind,
        collection: &str,
    ) -> Option<Arc<dyn OperationHandler>> {
        self.exact
            .get(&(kind, collection.to_string()))
            .or_else(|| self.wildcard.get(&kind))
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_empty()
    }
}
