//! Durable Storage Abstractions
//!
//! Defines the persistence contract between the sync core and the host
//! platform. The core never talks to a database directly; it writes opaque
//! JSON documents through [`CollectionStore`] and flat preference values
//! through [`SettingsStore`].
//!
//! ## Durability model
//!
//! Both stores are best-effort durability, not a source of truth. The core
//! keeps its authoritative state in memory and rewrites collections wholesale
//! after each structural change. A failed write is logged by the caller and
//! retried implicitly on the next mutation.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::store::CollectionStore;
//!
//! async fn persist_queue(store: &dyn CollectionStore, items: &[serde_json::Value]) {
//!     if let Err(e) = store.write_all("sync_queue", items).await {
//!         tracing::warn!(error = %e, "queue persistence failed");
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Durable key/value collection storage.
///
/// A collection is a named bag of JSON documents, each addressable by a
/// string key. Implementations decide the backing medium (SQLite, flat
/// files, browser storage); the core only requires the five operations
/// below.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Replace the full contents of a collection.
    async fn write_all(&self, collection: &str, items: &[Value]) -> Result<()>;

    /// Write or overwrite a single document.
    async fn write_one(&self, collection: &str, key: &str, item: &Value) -> Result<()>;

    /// Read every document in a collection.
    ///
    /// Returns an empty vector for an unknown collection.
    async fn read_all(&self, collection: &str) -> Result<Vec<Value>>;

    /// Read a single document by key, if present.
    async fn read_one(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// Remove a collection and all of its documents.
    async fn clear(&self, collection: &str) -> Result<()>;
}

/// Flat key/value preferences storage.
///
/// Used for small typed configuration values that must survive restarts
/// (retry budgets, backoff tuning, the default conflict strategy).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::store::SettingsStore;
///
/// async fn save_policy(store: &dyn SettingsStore) -> bridge_traits::error::Result<()> {
///     store.set_i64("sync.max_retries", 5).await?;
///     store.set_bool("sync.auto_process_enabled", true).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Store a floating-point value
    async fn set_f64(&self, key: &str, value: f64) -> Result<()>;

    /// Retrieve a floating-point value
    async fn get_f64(&self, key: &str) -> Result<Option<f64>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
