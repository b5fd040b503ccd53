//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync core and platform-specific
//! implementations. Each trait represents a capability the core requires but
//! that must be provided differently per host (desktop, mobile, tests).
//!
//! ## Traits
//!
//! ### Storage
//! - [`CollectionStore`](store::CollectionStore) - Durable JSON collection storage for crash recovery
//! - [`SettingsStore`](store::SettingsStore) - Flat key-value preferences storage
//!
//! ### Platform Integration
//! - [`ConnectivityMonitor`](connectivity::ConnectivityMonitor) - Online/offline signal with edge events
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Durability expectations
//!
//! The core treats every bridge as best-effort: a failed store call is logged
//! and swallowed, and in-memory state remains authoritative until the next
//! successful write. Implementations should surface descriptive
//! [`BridgeError`](error::BridgeError) values rather than panicking.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod connectivity;
pub mod error;
pub mod store;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use connectivity::{ConnectivityChangeStream, ConnectivityMonitor, ConnectivityStatus};
pub use store::{CollectionStore, SettingsStore};
pub use time::{Clock, SystemClock};
