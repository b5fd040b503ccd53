//! # Conflict Reconciler
//!
//! Records divergent local/server document versions and resolves them under
//! a configurable strategy.
//!
//! ## Overview
//!
//! A conflict is detected when the same document carries different data on
//! both sides. Detection records an immutable pair of snapshots; resolution
//! picks a winner but never deletes the record, so a caller can audit what
//! was decided. `clear_resolved` purges resolved records in bulk.
//!
//! The default strategy persists through the host settings store so it
//! survives restarts.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::store::SettingsStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::events::{ConflictEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Settings key holding the persisted default strategy
pub const STRATEGY_SETTINGS_KEY: &str = "sync.conflict_strategy";

/// Type-safe conflict identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(Uuid);

impl ConflictId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SyncError::ConflictNotFound {
                conflict_id: s.to_string(),
            })
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConflictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a conflict's winner is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// The side with the newer modification timestamp wins
    #[default]
    NewestWins,
    /// The local version always wins
    ClientWins,
    /// The server version always wins
    ServerWins,
}

impl ConflictStrategy {
    /// Convert strategy to its persisted string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewestWins => "newest_wins",
            Self::ClientWins => "client_wins",
            Self::ServerWins => "server_wins",
        }
    }
}

impl std::str::FromStr for ConflictStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "newest_wins" => Ok(Self::NewestWins),
            "client_wins" => Ok(Self::ClientWins),
            "server_wins" => Ok(Self::ServerWins),
            _ => Err(SyncError::InvalidStrategy(s.to_string())),
        }
    }
}

/// One side of a potential conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub collection: String,
    pub document_id: String,
    pub data: Value,
    pub modified_at: DateTime<Utc>,
}

/// A recorded divergence between local and server versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConflict {
    pub id: ConflictId,
    pub collection: String,
    pub document_id: String,
    pub local_data: Value,
    pub server_data: Value,
    pub local_modified_at: DateTime<Utc>,
    pub server_modified_at: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<ConflictStrategy>,
}

/// Which side a resolution picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Client,
    Server,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

/// Outcome of resolving one conflict
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The winning document data
    pub data: Value,
    /// Strategy that made the decision
    pub strategy: ConflictStrategy,
    /// Which side won
    pub winner: Winner,
}

/// Records and resolves sync conflicts
pub struct ConflictResolver {
    strategy: RwLock<ConflictStrategy>,
    conflicts: Mutex<HashMap<ConflictId, SyncConflict>>,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
}

impl ConflictResolver {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            strategy: RwLock::new(ConflictStrategy::default()),
            conflicts: Mutex::new(HashMap::new()),
            settings,
            clock,
            event_bus,
        }
    }

    /// Restore a persisted default strategy, if one was saved.
    ///
    /// Missing or unparseable values keep the built-in default.
    pub async fn load_default_strategy(&self) {
        match self.settings.get_string(STRATEGY_SETTINGS_KEY).await {
            Ok(Some(raw)) => match raw.parse::<ConflictStrategy>() {
                Ok(strategy) => {
                    let mut guard = self.strategy.write().await;
                    *guard = strategy;
                    debug!(strategy = strategy.as_str(), "Restored conflict strategy");
                }
                Err(_) => {
                    warn!(value = %raw, "Ignoring unrecognized persisted conflict strategy");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read persisted conflict strategy");
            }
        }
    }

    /// Compare two versions of a document.
    ///
    /// Returns `None` when the versions describe different documents or
    /// carry identical data. Otherwise records and returns a new conflict.
    pub async fn detect(
        &self,
        local: &DocumentVersion,
        server: &DocumentVersion,
    ) -> Option<SyncConflict> {
        if local.collection != server.collection || local.document_id != server.document_id {
            return None;
        }
        if local.data == server.data {
            return None;
        }

        let conflict = SyncConflict {
            id: ConflictId::new(),
            collection: local.collection.clone(),
            document_id: local.document_id.clone(),
            local_data: local.data.clone(),
            server_data: server.data.clone(),
            local_modified_at: local.modified_at,
            server_modified_at: server.modified_at,
            detected_at: self.clock.now(),
            resolved: false,
            resolution: None,
        };

        info!(
            conflict_id = %conflict.id,
            collection = %conflict.collection,
            document_id = %conflict.document_id,
            "Sync conflict detected"
        );
        self.emit(ConflictEvent::Detected {
            conflict_id: conflict.id.as_str(),
            entity_type: conflict.collection.clone(),
            entity_id: conflict.document_id.clone(),
        });

        let mut conflicts = self.conflicts.lock().await;
        conflicts.insert(conflict.id, conflict.clone());
        Some(conflict)
    }

    /// Resolve a recorded conflict.
    ///
    /// The effective strategy (explicit override, else the default) is read
    /// once at invocation; a concurrent `set_default_strategy` cannot change
    /// a resolution already underway. The conflict record stays in place,
    /// marked resolved with the strategy that decided it.
    pub async fn resolve(
        &self,
        conflict_id: ConflictId,
        strategy_override: Option<ConflictStrategy>,
    ) -> Result<Resolution> {
        let strategy = match strategy_override {
            Some(strategy) => strategy,
            None => *self.strategy.read().await,
        };

        let mut conflicts = self.conflicts.lock().await;
        let conflict =
            conflicts
                .get_mut(&conflict_id)
                .ok_or_else(|| SyncError::ConflictNotFound {
                    conflict_id: conflict_id.as_str(),
                })?;

        let winner = match strategy {
            ConflictStrategy::ClientWins => Winner::Client,
            ConflictStrategy::ServerWins => Winner::Server,
            ConflictStrategy::NewestWins => {
                if conflict.local_modified_at >= conflict.server_modified_at {
                    Winner::Client
                } else {
                    Winner::Server
                }
            }
        };

        let data = match winner {
            Winner::Client => conflict.local_data.clone(),
            Winner::Server => conflict.server_data.clone(),
        };

        conflict.resolved = true;
        conflict.resolution = Some(strategy);

        info!(
            conflict_id = %conflict_id,
            strategy = strategy.as_str(),
            winner = winner.as_str(),
            "Sync conflict resolved"
        );
        self.emit(ConflictEvent::Resolved {
            conflict_id: conflict_id.as_str(),
            strategy: strategy.as_str().to_string(),
            winner: winner.as_str().to_string(),
        });

        Ok(Resolution {
            data,
            strategy,
            winner,
        })
    }

    /// Change the default strategy and persist it best-effort
    pub async fn set_default_strategy(&self, strategy: ConflictStrategy) {
        {
            let mut guard = self.strategy.write().await;
            *guard = strategy;
        }

        if let Err(e) = self
            .settings
            .set_string(STRATEGY_SETTINGS_KEY, strategy.as_str())
            .await
        {
            warn!(error = %e, "Failed to persist conflict strategy");
        }
    }

    pub async fn default_strategy(&self) -> ConflictStrategy {
        *self.strategy.read().await
    }

    /// All conflicts awaiting resolution
    pub async fn unresolved(&self) -> Vec<SyncConflict> {
        self.conflicts
            .lock()
            .await
            .values()
            .filter(|c| !c.resolved)
            .cloned()
            .collect()
    }

    pub async fn unresolved_count(&self) -> usize {
        self.conflicts
            .lock()
            .await
            .values()
            .filter(|c| !c.resolved)
            .count()
    }

    /// Drop resolved conflict records. Returns how many were removed.
    pub async fn clear_resolved(&self) -> usize {
        let mut conflicts = self.conflicts.lock().await;
        let before = conflicts.len();
        conflicts.retain(|_, c| !c.resolved);
        before - conflicts.len()
    }

    fn emit(&self, event: ConflictEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Conflict(event)).ok();
        }
    }
}
