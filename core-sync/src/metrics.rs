//! # Sync Metrics
//!
//! Shared counters describing queue activity, each outcome broken down by
//! priority. All counters are atomics so the queue and processor can record
//! without locking; readers take a consistent-enough [`MetricsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::item::Priority;

/// One atomic counter per priority band
#[derive(Debug, Default)]
struct PriorityCells {
    critical: AtomicU64,
    high: AtomicU64,
    normal: AtomicU64,
    low: AtomicU64,
}

impl PriorityCells {
    fn bump(&self, priority: Priority) {
        let cell = match priority {
            Priority::Critical => &self.critical,
            Priority::High => &self.high,
            Priority::Normal => &self.normal,
            Priority::Low => &self.low,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PriorityCounts {
        PriorityCounts {
            critical: self.critical.load(Ordering::Relaxed),
            high: self.high.load(Ordering::Relaxed),
            normal: self.normal.load(Ordering::Relaxed),
            low: self.low.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.critical.store(0, Ordering::Relaxed);
        self.high.store(0, Ordering::Relaxed);
        self.normal.store(0, Ordering::Relaxed);
        self.low.store(0, Ordering::Relaxed);
    }
}

/// Counts of one outcome broken down by priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub critical: u64,
    pub high: u64,
    pub normal: u64,
    pub low: u64,
}

impl PriorityCounts {
    /// Sum across all priority bands
    pub fn total(&self) -> u64 {
        self.critical + self.high + self.normal + self.low
    }

    /// Count for one priority band
    pub fn for_priority(&self, priority: Priority) -> u64 {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Normal => self.normal,
            Priority::Low => self.low,
        }
    }
}

/// Interior-mutable metrics aggregator shared across queue and processor
#[derive(Debug, Default)]
pub struct SyncMetrics {
    enqueued: PriorityCells,
    succeeded: PriorityCells,
    failed: PriorityCells,
    discarded: PriorityCells,
    attempts: AtomicU64,
    total_processing_ms: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an admitted operation
    pub fn record_enqueued(&self, priority: Priority) {
        self.enqueued.bump(priority);
    }

    /// Record one finished attempt and its latency
    pub fn record_attempt(&self, elapsed_ms: u64) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.total_processing_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn record_success(&self, priority: Priority) {
        self.succeeded.bump(priority);
    }

    pub fn record_failure(&self, priority: Priority) {
        self.failed.bump(priority);
    }

    pub fn record_discard(&self, priority: Priority) {
        self.discarded.bump(priority);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.attempts.load(Ordering::Relaxed);
        let total_ms = self.total_processing_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            enqueued: self.enqueued.snapshot(),
            succeeded: self.succeeded.snapshot(),
            failed: self.failed.snapshot(),
            discarded: self.discarded.snapshot(),
            attempts,
            average_processing_ms: if attempts == 0 {
                0.0
            } else {
                total_ms as f64 / attempts as f64
            },
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.enqueued.reset();
        self.succeeded.reset();
        self.failed.reset();
        self.discarded.reset();
        self.attempts.store(0, Ordering::Relaxed);
        self.total_processing_ms.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the metrics counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub enqueued: PriorityCounts,
    pub succeeded: PriorityCounts,
    pub failed: PriorityCounts,
    pub discarded: PriorityCounts,
    pub attempts: u64,
    pub average_processing_ms: f64,
}

impl MetricsSnapshot {
    /// Total operations admitted across all priorities
    pub fn total_enqueued(&self) -> u64 {
        self.enqueued.total()
    }
}
