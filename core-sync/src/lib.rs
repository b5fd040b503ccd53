//! # Offline Sync Engine
//!
//! Queues local changes while offline and replays them against the backend
//! when connectivity returns.
//!
//! ## Overview
//!
//! This module manages the full offline-first sync lifecycle, including:
//! - Admitting operations into a priority-ordered durable queue
//! - Replaying queued operations through registered handlers
//! - Retrying failures with capped exponential backoff and jitter
//! - Reacting to connectivity changes and a periodic timer
//! - Detecting and resolving concurrent-edit conflicts
//! - Suppressing a device's own echoed changes
//!
//! ## Components
//!
//! - **Queue Items** (`item`): Operation records with kind, priority, and retry state
//! - **Operation Queue** (`queue`): Priority-ordered durable queue with owner gating
//! - **Handlers** (`handler`): Per kind-and-collection execution registry with wildcard fallback
//! - **Processor** (`processor`): Single-pass draining loop with an overlap guard
//! - **Backoff** (`backoff`): Exponential retry delays with a cap and jitter
//! - **Scheduler** (`scheduler`): Connectivity-edge and timer driven processing
//! - **Conflicts** (`conflict`): Concurrent-edit detection and strategy-based resolution
//! - **Broadcast** (`broadcast`): Cross-device change envelopes with self-echo suppression
//! - **Metrics** (`metrics`): Lifetime counters for queue activity
//! - **Settings** (`settings`): Persisted retry and timer configuration
//! - **Coordinator** (`coordinator`): Facade wiring the engine over the host bridges

pub mod backoff;
pub mod broadcast;
pub mod conflict;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod item;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod scheduler;
pub mod settings;

pub use backoff::BackoffPolicy;
pub use broadcast::{ApplyDecision, ChangeBroadcaster, ChangeEnvelope, DeviceId};
pub use conflict::{
    ConflictId, ConflictResolver, ConflictStrategy, DocumentVersion, Resolution, SyncConflict,
    Winner,
};
pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use handler::{HandlerRegistry, OperationHandler};
pub use item::{
    EnqueueOptions, OperationId, OperationKind, OperationStatus, Priority, QueueItem,
};
pub use metrics::{MetricsSnapshot, PriorityCounts, SyncMetrics};
pub use processor::{PassReport, QueueProcessor};
pub use queue::{OperationQueue, QueueSummary};
pub use scheduler::{SyncScheduler, TimerConfig};
pub use settings::SyncSettings;
