//! Manually Driven Connectivity Monitor
//!
//! A connectivity monitor whose state is set by the host (or a test) rather
//! than probed from the network. Transitions fan out to every subscribed
//! stream through a `tokio::sync::watch` channel, so subscribers observe
//! edges, not polls.

use async_trait::async_trait;
use bridge_traits::{
    connectivity::{ConnectivityChangeStream, ConnectivityMonitor, ConnectivityStatus},
    error::Result,
};
use tokio::sync::watch;
use tracing::debug;

/// Connectivity monitor driven by explicit [`set_online`](ManualConnectivityMonitor::set_online) calls.
pub struct ManualConnectivityMonitor {
    sender: watch::Sender<ConnectivityStatus>,
}

impl ManualConnectivityMonitor {
    /// Create a monitor with the given initial status.
    pub fn new(initial: ConnectivityStatus) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Create a monitor that starts online.
    pub fn online() -> Self {
        Self::new(ConnectivityStatus::Online)
    }

    /// Create a monitor that starts offline.
    pub fn offline() -> Self {
        Self::new(ConnectivityStatus::Offline)
    }

    /// Flip the connectivity state. Subscribers only see actual edges;
    /// setting the same state twice emits nothing.
    pub fn set_online(&self, online: bool) {
        let status = if online {
            ConnectivityStatus::Online
        } else {
            ConnectivityStatus::Offline
        };
        self.sender.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                debug!(?status, "connectivity transition");
                *current = status;
                true
            }
        });
    }
}

impl Default for ManualConnectivityMonitor {
    fn default() -> Self {
        Self::online()
    }
}

#[async_trait]
impl ConnectivityMonitor for ManualConnectivityMonitor {
    async fn status(&self) -> Result<ConnectivityStatus> {
        Ok(*self.sender.borrow())
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn ConnectivityChangeStream>> {
        Ok(Box::new(WatchChangeStream {
            receiver: self.sender.subscribe(),
        }))
    }
}

struct WatchChangeStream {
    receiver: watch::Receiver<ConnectivityStatus>,
}

#[async_trait]
impl ConnectivityChangeStream for WatchChangeStream {
    async fn next(&mut self) -> Option<ConnectivityStatus> {
        match self.receiver.changed().await {
            Ok(()) => Some(*self.receiver.borrow_and_update()),
            Err(_) => None,
        }
    }
}
