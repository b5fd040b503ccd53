//! Connectivity Signal Abstraction
//!
//! Provides the online/offline signal that gates queue processing.
//!
//! The core does not probe the network itself; it consumes a boolean signal
//! from the host platform. Hosts wire in whatever detection mechanism fits
//! (OS reachability APIs, browser `online` events, a manual toggle in
//! tests) and deliver edge transitions through [`ConnectivityChangeStream`].

use async_trait::async_trait;

use crate::error::Result;

/// Connectivity status as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// The device can reach the network.
    Online,
    /// The device has no usable connection.
    Offline,
}

impl ConnectivityStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityStatus::Online)
    }
}

/// Connectivity monitor trait.
///
/// Allows the sync core to:
/// - Skip processing passes while offline
/// - Trigger an immediate pass when connectivity returns
///
/// # Example
///
/// ```ignore
/// use bridge_traits::connectivity::ConnectivityMonitor;
///
/// async fn can_sync(monitor: &dyn ConnectivityMonitor) -> bool {
///     monitor.is_online().await
/// }
/// ```
#[async_trait]
pub trait ConnectivityMonitor: Send + Sync {
    /// Get the current connectivity status.
    async fn status(&self) -> Result<ConnectivityStatus>;

    /// Check if currently online.
    ///
    /// An errored status check is treated as offline; the queue simply
    /// waits for the next positive signal.
    async fn is_online(&self) -> bool {
        matches!(self.status().await, Ok(ConnectivityStatus::Online))
    }

    /// Subscribe to connectivity transitions.
    ///
    /// Implementations emit one event per edge (offline→online or
    /// online→offline), not one per probe.
    async fn subscribe_changes(&self) -> Result<Box<dyn ConnectivityChangeStream>>;
}

/// Stream of connectivity transitions.
#[async_trait]
pub trait ConnectivityChangeStream: Send {
    /// Get the next connectivity transition.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<ConnectivityStatus>;
}
