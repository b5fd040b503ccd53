//! # Sync Scheduler
//!
//! Drives the processing loop from the outside world: connectivity edges and
//! a periodic timer.
//!
//! ## Overview
//!
//! The scheduler is a spawned tokio task. It mirrors connectivity status
//! into the processor's online flag and, on an offline-to-online edge,
//! immediately attempts a pass when the queue is non-empty. Independently, a
//! periodic interval attempts a pass while online and auto-processing is
//! enabled. Timer reconfiguration arrives over a `tokio::sync::watch`
//! channel and rebuilds the interval in place.
//!
//! Shutdown goes through a `CancellationToken` so the task exits at the next
//! suspension point.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::connectivity::ConnectivityMonitor;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::processor::QueueProcessor;
use crate::queue::OperationQueue;

/// Default period between automatic processing attempts
pub const DEFAULT_PROCESS_INTERVAL_MS: u64 = 5_000;

/// Timer settings consumed by the scheduler task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Period between automatic passes
    pub interval_ms: u64,
    /// Whether the periodic timer fires at all
    pub enabled: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PROCESS_INTERVAL_MS,
            enabled: true,
        }
    }
}

/// Connectivity and timer driver for the queue processor
pub struct SyncScheduler {
    cancel: CancellationToken,
    config_tx: watch::Sender<TimerConfig>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    /// Spawn the scheduler task.
    ///
    /// The connectivity subscription happens inside the task; if the monitor
    /// cannot provide a change stream the scheduler degrades to timer-only
    /// operation and logs a warning.
    pub fn start(
        processor: Arc<QueueProcessor>,
        queue: Arc<OperationQueue>,
        monitor: Arc<dyn ConnectivityMonitor>,
        config: TimerConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (config_tx, config_rx) = watch::channel(config);

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run(processor, queue, monitor, config_rx, task_cancel).await;
        });

        Self {
            cancel,
            config_tx,
            handle: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Reconfigure the periodic timer; the running interval is rebuilt
    pub fn configure_timer(&self, interval_ms: u64, enabled: bool) {
        let config = TimerConfig {
            interval_ms,
            enabled,
        };
        if self.config_tx.send(config).is_err() {
            warn!("Scheduler task is gone, timer configuration dropped");
        }
    }

    /// Stop the scheduler task and wait for it to exit
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler task did not shut down cleanly");
            }
        }
        info!("Sync scheduler stopped");
    }
}

fn build_interval(interval_ms: u64) -> tokio::time::Interval {
    let period = Duration::from_millis(interval_ms.max(1));
    // interval_at so a rebuild does not fire immediately
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

async fn run(
    processor: Arc<QueueProcessor>,
    queue: Arc<OperationQueue>,
    monitor: Arc<dyn ConnectivityMonitor>,
    mut config_rx: watch::Receiver<TimerConfig>,
    cancel: CancellationToken,
) {
    processor.set_online(monitor.is_online().await);

    let mut stream = match monitor.subscribe_changes().await {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "Connectivity subscription failed, running timer-only");
            None
        }
    };

    let mut config = *config_rx.borrow();
    let mut interval = build_interval(config.interval_ms);

    info!(
        interval_ms = config.interval_ms,
        enabled = config.enabled,
        "Sync scheduler started"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            changed = config_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                config = *config_rx.borrow_and_update();
                interval = build_interval(config.interval_ms);
                debug!(
                    interval_ms = config.interval_ms,
                    enabled = config.enabled,
                    "Scheduler timer reconfigured"
                );
            }

            status = async { stream.as_mut().unwrap().next().await }, if stream.is_some() => {
                match status {
                    Some(status) => {
                        let was_online = processor.is_online();
                        let now_online = status.is_online();
                        processor.set_online(now_online);
                        debug!(online = now_online, "Connectivity changed");

                        if now_online && !was_online && !queue.is_empty().await {
                            info!("Back online, attempting queued operations");
                            processor.process_queue().await;
                        }
                    }
                    None => {
                        warn!("Connectivity stream closed, running timer-only");
                        stream = None;
                    }
                }
            }

            _ = interval.tick(), if config.enabled => {
                if processor.is_online() {
                    processor.process_queue().await;
                }
            }
        }
    }
}
