//! # Queue Processing Loop
//!
//! Single-pass, at-most-one-in-flight draining of the operation queue.
//!
//! ## Overview
//!
//! A pass takes the ready items in priority order and runs them
//! sequentially. An item whose retry budget is already exhausted is
//! discarded without another attempt; the rest resolve a handler, execute,
//! and record the outcome. Handler failures are stringified into the item's
//! `last_error` and reschedule the item as Failed; they never escape the
//! pass, so one bad item cannot abort the rest.
//!
//! An atomic compare-exchange guard keeps passes from overlapping; a second
//! caller gets a zeroed [`PassReport`] instead of waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::error::{Result, SyncError};
use crate::handler::HandlerRegistry;
use crate::item::OperationStatus;
use crate::metrics::SyncMetrics;
use crate::queue::OperationQueue;

/// Outcome counts for one processing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Items attempted
    pub total: u64,
    /// Items that completed
    pub succeeded: u64,
    /// Items that failed and remain queued
    pub failed: u64,
    /// Items discarded for exhausting their retry budget
    pub discarded: u64,
}

/// Drains the operation queue one pass at a time
pub struct QueueProcessor {
    queue: Arc<OperationQueue>,
    registry: Arc<RwLock<HandlerRegistry>>,
    backoff: std::sync::RwLock<BackoffPolicy>,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
    online: Arc<AtomicBool>,
    in_flight: AtomicBool,
    event_bus: Option<EventBus>,
}

impl QueueProcessor {
    pub fn new(
        queue: Arc<OperationQueue>,
        registry: Arc<RwLock<HandlerRegistry>>,
        backoff: BackoffPolicy,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
        online: Arc<AtomicBool>,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            queue,
            registry,
            backoff: std::sync::RwLock::new(backoff),
            clock,
            metrics,
            online,
            in_flight: AtomicBool::new(false),
            event_bus,
        }
    }

    /// Replace the backoff policy used for subsequent failures
    pub fn set_backoff(&self, policy: BackoffPolicy) {
        *self.backoff.write().unwrap() = policy;
    }

    /// Update the connectivity flag consulted before each pass
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Run one processing pass.
    ///
    /// Zeroed no-op when offline, when a pass is already in flight, or when
    /// nothing is ready.
    pub async fn process_queue(&self) -> PassReport {
        if !self.is_online() {
            debug!("Skipping processing pass, device is offline");
            return PassReport::default();
        }
        self.run_guarded_pass().await
    }

    /// Run one pass regardless of the auto-processing schedule.
    ///
    /// Unlike [`process_queue`](Self::process_queue), being offline is an
    /// explicit error here so interactive callers can surface it.
    pub async fn force_process(&self) -> Result<PassReport> {
        if !self.is_online() {
            return Err(SyncError::Offline);
        }
        Ok(self.run_guarded_pass().await)
    }

    async fn run_guarded_pass(&self) -> PassReport {
        // At most one pass in flight; losers get a zeroed report
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Processing pass already in flight");
            return PassReport::default();
        }

        let report = self.run_pass().await;
        self.in_flight.store(false, Ordering::SeqCst);
        report
    }

    async fn run_pass(&self) -> PassReport {
        let ready = self.queue.ready_items().await;
        if ready.is_empty() {
            return PassReport::default();
        }

        info!(ready_count = ready.len(), "Starting processing pass");
        let mut report = PassReport {
            total: ready.len() as u64,
            ..PassReport::default()
        };

        for item in ready {
            // Exhaustion is judged at pickup so the pass that observed the
            // final failure left the item Failed with its full retry count
            if !item.can_retry() {
                self.queue
                    .update_status(item.id, OperationStatus::Discarded, None)
                    .await;
                self.metrics.record_discard(item.priority);
                report.discarded += 1;
                warn!(
                    operation_id = %item.id,
                    retry_count = item.retry_count,
                    max_retries = item.max_retries,
                    "Retry budget exhausted, discarding operation"
                );
                self.emit(QueueEvent::OperationDiscarded {
                    operation_id: item.id.as_str(),
                    kind: item.kind.as_str().to_string(),
                    retry_count: item.retry_count,
                });
                continue;
            }

            self.queue
                .update_status(item.id, OperationStatus::Processing, None)
                .await;

            let handler = {
                let registry = self.registry.read().await;
                registry.resolve(item.kind, &item.collection)
            };

            let started = Instant::now();
            let outcome = match handler {
                Some(handler) => handler.execute(&item).await,
                None => {
                    debug!(
                        operation_id = %item.id,
                        kind = item.kind.as_str(),
                        collection = %item.collection,
                        "No handler registered, treating as success"
                    );
                    Ok(true)
                }
            };
            self.metrics
                .record_attempt(started.elapsed().as_millis() as u64);

            match outcome {
                Ok(true) => {
                    self.queue
                        .update_status(item.id, OperationStatus::Completed, None)
                        .await;
                    self.metrics.record_success(item.priority);
                    report.succeeded += 1;
                    debug!(operation_id = %item.id, "Operation completed");
                    self.emit(QueueEvent::OperationCompleted {
                        operation_id: item.id.as_str(),
                        kind: item.kind.as_str().to_string(),
                        attempts: item.retry_count + 1,
                    });
                }
                failure => {
                    let message = match failure {
                        Err(e) => e.to_string(),
                        _ => "handler reported failure".to_string(),
                    };
                    let next_eligible_at = {
                        let backoff = self.backoff.read().unwrap();
                        backoff.next_eligible_at(self.clock.now(), item.retry_count + 1)
                    };

                    let Some(updated) = self
                        .queue
                        .fail_attempt(item.id, message.clone(), next_eligible_at)
                        .await
                    else {
                        continue;
                    };

                    self.metrics.record_failure(item.priority);
                    report.failed += 1;
                    warn!(
                        operation_id = %item.id,
                        retry_count = updated.retry_count,
                        max_retries = updated.max_retries,
                        error = %message,
                        "Operation failed, will retry"
                    );
                    self.emit(QueueEvent::OperationFailed {
                        operation_id: item.id.as_str(),
                        kind: item.kind.as_str().to_string(),
                        retry_count: updated.retry_count,
                        message,
                    });
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            discarded = report.discarded,
            "Processing pass finished"
        );
        self.emit(QueueEvent::PassFinished {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
            discarded: report.discarded,
        });
        report
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Queue(event)).ok();
        }
    }
}
