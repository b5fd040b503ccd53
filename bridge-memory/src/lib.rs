//! # In-Memory Bridge Implementations
//!
//! Volatile implementations of the host bridge traits.
//!
//! ## Overview
//!
//! This crate provides in-memory stand-ins for every bridge the sync core
//! consumes: a collection store, a settings store, a manually driven
//! connectivity monitor, and a manually advanced clock. They back the test
//! suites of the core crates and can serve short-lived hosts that do not
//! need durability.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_memory::{ManualClock, ManualConnectivityMonitor, MemoryCollectionStore};
//!
//! let store = MemoryCollectionStore::new();
//! let monitor = ManualConnectivityMonitor::offline();
//! let clock = ManualClock::starting_now();
//! ```

pub mod connectivity;
pub mod store;
pub mod time;

pub use connectivity::ManualConnectivityMonitor;
pub use store::{MemoryCollectionStore, MemorySettingsStore};
pub use time::ManualClock;
