//! # Operation Queue
//!
//! Priority-ordered, durable queue of offline operations.
//!
//! ## Overview
//!
//! The queue owns the authoritative in-memory list of [`QueueItem`]s and
//! mirrors every structural change to the host's collection store for crash
//! recovery. Persistence is best-effort: a failed store write is logged and
//! swallowed, and the in-memory state remains authoritative until the next
//! successful write.
//!
//! ## Ordering
//!
//! The list is kept sorted ascending by priority at all times; items of
//! equal priority keep admission order (stable insertion). After a
//! crash-restart reload the admission order is gone, so ties fall back to
//! `created_at`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::{EnqueueOptions, OperationKind, OperationQueue};
//!
//! # async fn example(queue: OperationQueue) -> core_sync::Result<()> {
//! queue.set_owner(Some("patient-1".to_string())).await;
//! let id = queue
//!     .enqueue(
//!         OperationKind::Create,
//!         "medications",
//!         serde_json::json!({"name": "Lisinopril", "dose_mg": 10}),
//!         EnqueueOptions::default(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bridge_traits::store::CollectionStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::item::{EnqueueOptions, OperationId, OperationKind, OperationStatus, Priority, QueueItem};
use crate::metrics::SyncMetrics;

/// Store collection holding the serialized queue
pub const QUEUE_COLLECTION: &str = "sync_queue";

/// Default retry budget for items that do not override it
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Priority-ordered durable operation queue
pub struct OperationQueue {
    items: RwLock<Vec<QueueItem>>,
    owner: RwLock<Option<String>>,
    store: Arc<dyn CollectionStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
    event_bus: Option<EventBus>,
    default_max_retries: u32,
}

impl OperationQueue {
    /// Create a queue over the given store and clock
    pub fn new(
        store: Arc<dyn CollectionStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            owner: RwLock::new(None),
            store,
            clock,
            metrics,
            event_bus,
            default_max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the default retry budget applied at enqueue time
    pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
        self.default_max_retries = max_retries;
        self
    }

    /// Set or clear the authenticated owner
    pub async fn set_owner(&self, owner: Option<String>) {
        let mut guard = self.owner.write().await;
        *guard = owner;
    }

    /// Current authenticated owner, if any
    pub async fn owner(&self) -> Option<String> {
        self.owner.read().await.clone()
    }

    /// Admit a new operation.
    ///
    /// Fails with [`SyncError::NoAuthenticatedOwner`] before any mutation
    /// when no owner is set. The item is inserted in priority order (stable
    /// within a priority band) and the whole queue is rewritten to the store
    /// best-effort.
    pub async fn enqueue(
        &self,
        kind: OperationKind,
        collection: &str,
        payload: Value,
        options: EnqueueOptions,
    ) -> Result<OperationId> {
        let owner_id = self
            .owner
            .read()
            .await
            .clone()
            .ok_or(SyncError::NoAuthenticatedOwner)?;

        let priority = options.priority.unwrap_or_default();
        let item = QueueItem {
            id: OperationId::new(),
            kind,
            collection: collection.to_string(),
            target_id: options.target_id,
            payload,
            priority,
            status: OperationStatus::Pending,
            retry_count: 0,
            max_retries: options.max_retries.unwrap_or(self.default_max_retries),
            next_eligible_at: None,
            created_at: self.clock.now(),
            last_attempt_at: None,
            last_error: None,
            owner_id,
            metadata: options.metadata,
        };
        let id = item.id;

        info!(
            operation_id = %id,
            kind = kind.as_str(),
            collection = collection,
            priority = priority.as_str(),
            "Enqueuing operation"
        );

        {
            let mut items = self.items.write().await;
            // Stable insert: after the last item with priority <= new
            let index = items.partition_point(|existing| existing.priority <= item.priority);
            items.insert(index, item);
        }

        self.metrics.record_enqueued(priority);
        self.emit(QueueEvent::OperationEnqueued {
            operation_id: id.as_str(),
            kind: kind.as_str().to_string(),
            priority: priority.as_str().to_string(),
        });

        self.persist().await;
        Ok(id)
    }

    /// Remove an item unconditionally. Returns whether it existed.
    pub async fn dequeue(&self, id: OperationId) -> bool {
        let removed = {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };

        if removed {
            debug!(operation_id = %id, "Dequeued operation");
            self.persist().await;
        }
        removed
    }

    /// Set an item's status directly.
    ///
    /// Stamps `last_attempt_at` on a transition into Failed or Completed,
    /// records `error` as the item's `last_error`, and clears the
    /// eligibility instant on a transition into Discarded. Returns whether
    /// the item was found.
    pub async fn update_status(
        &self,
        id: OperationId,
        status: OperationStatus,
        error: Option<String>,
    ) -> bool {
        let now = self.clock.now();
        let updated = {
            let mut items = self.items.write().await;
            match items.iter_mut().find(|item| item.id == id) {
                Some(item) => {
                    item.status = status;
                    if matches!(
                        status,
                        OperationStatus::Failed | OperationStatus::Completed
                    ) {
                        item.last_attempt_at = Some(now);
                    }
                    if status == OperationStatus::Discarded {
                        item.next_eligible_at = None;
                    }
                    if error.is_some() {
                        item.last_error = error;
                    }
                    true
                }
                None => false,
            }
        };

        if updated {
            self.persist().await;
        }
        updated
    }

    /// Record a failed attempt.
    ///
    /// Increments the retry count and returns the item to Failed with the
    /// supplied eligibility instant. Exhaustion of the retry budget is
    /// judged when the item next comes up for processing, not here, so the
    /// pass that observes the final failure leaves the item Failed. Returns
    /// the updated item.
    pub async fn fail_attempt(
        &self,
        id: OperationId,
        error: String,
        next_eligible_at: DateTime<Utc>,
    ) -> Option<QueueItem> {
        let now = self.clock.now();
        let updated = {
            let mut items = self.items.write().await;
            let item = items.iter_mut().find(|item| item.id == id)?;
            item.retry_count += 1;
            item.last_error = Some(error);
            item.last_attempt_at = Some(now);
            item.status = OperationStatus::Failed;
            item.next_eligible_at = Some(next_eligible_at);
            item.clone()
        };

        self.persist().await;
        Some(updated)
    }

    /// Items eligible for processing right now, in queue (priority) order
    pub async fn ready_items(&self) -> Vec<QueueItem> {
        let now = self.clock.now();
        self.items
            .read()
            .await
            .iter()
            .filter(|item| item.is_ready(now))
            .cloned()
            .collect()
    }

    /// Look up a single item
    pub async fn get_item(&self, id: OperationId) -> Option<QueueItem> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// All items currently in the given status, in queue order
    pub async fn items_by_status(&self, status: OperationStatus) -> Vec<QueueItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| item.status == status)
            .cloned()
            .collect()
    }

    /// All items at the given priority, in queue order
    pub async fn items_by_priority(&self, priority: Priority) -> Vec<QueueItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| item.priority == priority)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Drop completed items. Returns how many were removed.
    pub async fn clear_completed(&self) -> usize {
        self.clear_by(|item| item.status == OperationStatus::Completed)
            .await
    }

    /// Drop discarded items. Returns how many were removed.
    pub async fn clear_discarded(&self) -> usize {
        self.clear_by(|item| item.status == OperationStatus::Discarded)
            .await
    }

    /// Drop everything. Returns how many were removed.
    pub async fn clear_all(&self) -> usize {
        self.clear_by(|_| true).await
    }

    async fn clear_by(&self, predicate: impl Fn(&QueueItem) -> bool) -> usize {
        let removed = {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        };

        if removed > 0 {
            info!(removed_count = removed, "Cleared queue items");
            self.persist().await;
        }
        removed
    }

    /// Return a Discarded or Failed item to Pending with a fresh retry budget.
    ///
    /// Any other status is an invalid transition.
    pub async fn reprocess(&self, id: OperationId) -> Result<()> {
        {
            let mut items = self.items.write().await;
            let item = items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| SyncError::OperationNotFound {
                    operation_id: id.as_str(),
                })?;

            if !matches!(
                item.status,
                OperationStatus::Discarded | OperationStatus::Failed
            ) {
                return Err(SyncError::InvalidStateTransition {
                    from: item.status.as_str().to_string(),
                    to: OperationStatus::Pending.as_str().to_string(),
                    reason: "only discarded or failed operations can be reprocessed".to_string(),
                });
            }

            item.status = OperationStatus::Pending;
            item.retry_count = 0;
            item.next_eligible_at = None;
            item.last_error = None;
        }

        info!(operation_id = %id, "Operation queued for reprocessing");
        self.persist().await;
        Ok(())
    }

    /// Counts by status and by priority
    pub async fn summary(&self) -> QueueSummary {
        let items = self.items.read().await;
        let mut summary = QueueSummary::default();
        for item in items.iter() {
            match item.status {
                OperationStatus::Pending => summary.pending += 1,
                OperationStatus::Processing => summary.processing += 1,
                OperationStatus::Completed => summary.completed += 1,
                OperationStatus::Failed => summary.failed += 1,
                OperationStatus::Discarded => summary.discarded += 1,
            }
            match item.priority {
                Priority::Critical => summary.critical += 1,
                Priority::High => summary.high += 1,
                Priority::Normal => summary.normal += 1,
                Priority::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Reload the queue from the store after a restart.
    ///
    /// Unparseable entries are logged and skipped. Items persisted mid-attempt
    /// (Processing) are demoted to Pending so they run again. The reloaded
    /// list is sorted by priority with `created_at` as the tie-break, since
    /// admission order is not persisted. Returns how many items were loaded.
    pub async fn restore(&self) -> Result<usize> {
        let raw = self
            .store
            .read_all(QUEUE_COLLECTION)
            .await
            .map_err(|e| SyncError::Persistence(e.to_string()))?;

        let mut loaded: Vec<QueueItem> = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<QueueItem>(value) {
                Ok(mut item) => {
                    if item.status == OperationStatus::Processing {
                        item.status = OperationStatus::Pending;
                    }
                    loaded.push(item);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable queue entry during restore");
                }
            }
        }

        loaded.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let count = loaded.len();
        {
            let mut items = self.items.write().await;
            *items = loaded;
        }

        info!(restored_count = count, "Restored operation queue");
        Ok(count)
    }

    /// Best-effort whole-collection rewrite.
    ///
    /// Suitable for queue sizes in the tens of items; a partial-update store
    /// schema would be needed beyond that. Failures leave the in-memory
    /// queue authoritative.
    async fn persist(&self) {
        let serialized: Vec<Value> = {
            let items = self.items.read().await;
            items
                .iter()
                .filter_map(|item| match serde_json::to_value(item) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(operation_id = %item.id, error = %e, "Failed to serialize queue item");
                        None
                    }
                })
                .collect()
        };

        if let Err(e) = self.store.write_all(QUEUE_COLLECTION, &serialized).await {
            warn!(error = %e, "Failed to persist operation queue, keeping in-memory state");
        }
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Queue(event)).ok();
        }
    }
}

/// Queue counts by status and priority
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub discarded: usize,
    pub critical: usize,
    pub high: usize,
    pub normal: usize,
    pub low: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_memory::{ManualClock, MemoryCollectionStore};
    use bridge_traits::error::BridgeError;
    use serde_json::json;

    fn test_queue() -> (OperationQueue, Arc<MemoryCollectionStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryCollectionStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let queue = OperationQueue::new(
            store.clone(),
            clock.clone(),
            Arc::new(SyncMetrics::new()),
            None,
        );
        (queue, store, clock)
    }

    async fn owned_queue() -> (OperationQueue, Arc<MemoryCollectionStore>, Arc<ManualClock>) {
        let (queue, store, clock) = test_queue();
        queue.set_owner(Some("patient-1".to_string())).await;
        (queue, store, clock)
    }

    fn options(priority: Priority) -> EnqueueOptions {
        EnqueueOptions {
            priority: Some(priority),
            ..EnqueueOptions::default()
        }
    }

    #[tokio::test]
    async fn test_enqueue_requires_owner() {
        let (queue, _, _) = test_queue();

        let result = queue
            .enqueue(
                OperationKind::Create,
                "medications",
                json!({}),
                EnqueueOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(SyncError::NoAuthenticatedOwner)));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_enqueue_priority_ordering_is_stable() {
        let (queue, _, _) = owned_queue().await;

        let normal_a = queue
            .enqueue(OperationKind::Create, "m", json!(1), options(Priority::Normal))
            .await
            .unwrap();
        let critical = queue
            .enqueue(OperationKind::Create, "m", json!(2), options(Priority::Critical))
            .await
            .unwrap();
        let normal_b = queue
            .enqueue(OperationKind::Create, "m", json!(3), options(Priority::Normal))
            .await
            .unwrap();
        let high = queue
            .enqueue(OperationKind::Create, "m", json!(4), options(Priority::High))
            .await
            .unwrap();

        let ready = queue.ready_items().await;
        let ids: Vec<_> = ready.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![critical, high, normal_a, normal_b]);
    }

    #[tokio::test]
    async fn test_ready_items_respects_eligibility() {
        let (queue, _, clock) = owned_queue().await;

        let id = queue
            .enqueue(OperationKind::Update, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        let eligible_at = clock.now() + chrono::Duration::milliseconds(2_000);
        queue.fail_attempt(id, "timeout".to_string(), eligible_at).await;

        assert!(queue.ready_items().await.is_empty());

        clock.advance_millis(2_001);
        let ready = queue.ready_items().await;
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].status, OperationStatus::Failed);
    }

    #[tokio::test]
    async fn test_fail_attempt_always_returns_item_to_failed() {
        let (queue, _, clock) = owned_queue().await;

        let id = queue
            .enqueue(
                OperationKind::Delete,
                "m",
                json!({}),
                EnqueueOptions {
                    max_retries: Some(2),
                    ..EnqueueOptions::default()
                },
            )
            .await
            .unwrap();

        let at = clock.now() + chrono::Duration::seconds(1);
        let first = queue.fail_attempt(id, "err 1".to_string(), at).await.unwrap();
        assert_eq!(first.status, OperationStatus::Failed);
        assert_eq!(first.retry_count, 1);

        // The attempt that spends the budget still lands on Failed; discard
        // is a separate transition at the next pickup
        let second = queue.fail_attempt(id, "err 2".to_string(), at).await.unwrap();
        assert_eq!(second.status, OperationStatus::Failed);
        assert_eq!(second.retry_count, 2);
        assert_eq!(second.last_error, Some("err 2".to_string()));
        assert_eq!(second.next_eligible_at, Some(at));
        assert!(!second.can_retry());
    }

    #[tokio::test]
    async fn test_discard_clears_eligibility() {
        let (queue, _, clock) = owned_queue().await;

        let id = queue
            .enqueue(OperationKind::Update, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        let at = clock.now() + chrono::Duration::seconds(1);
        queue.fail_attempt(id, "err".to_string(), at).await.unwrap();

        queue.update_status(id, OperationStatus::Discarded, None).await;
        let item = queue.get_item(id).await.unwrap();
        assert_eq!(item.status, OperationStatus::Discarded);
        assert!(item.next_eligible_at.is_none());
    }

    #[tokio::test]
    async fn test_update_status_stamps_last_attempt() {
        let (queue, _, _) = owned_queue().await;

        let id = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        queue.update_status(id, OperationStatus::Processing, None).await;
        assert!(queue.get_item(id).await.unwrap().last_attempt_at.is_none());

        queue.update_status(id, OperationStatus::Completed, None).await;
        assert!(queue.get_item(id).await.unwrap().last_attempt_at.is_some());
    }

    #[tokio::test]
    async fn test_dequeue_removes_unconditionally() {
        let (queue, _, _) = owned_queue().await;

        let id = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();
        queue.update_status(id, OperationStatus::Processing, None).await;

        assert!(queue.dequeue(id).await);
        assert!(!queue.dequeue(id).await);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_reprocess_resets_retry_state() {
        let (queue, _, clock) = owned_queue().await;

        let id = queue
            .enqueue(
                OperationKind::Update,
                "m",
                json!({}),
                EnqueueOptions {
                    max_retries: Some(1),
                    ..EnqueueOptions::default()
                },
            )
            .await
            .unwrap();

        let at = clock.now() + chrono::Duration::seconds(5);
        let failed = queue.fail_attempt(id, "boom".to_string(), at).await.unwrap();
        assert_eq!(failed.status, OperationStatus::Failed);
        queue.update_status(id, OperationStatus::Discarded, None).await;

        queue.reprocess(id).await.unwrap();
        let item = queue.get_item(id).await.unwrap();
        assert_eq!(item.status, OperationStatus::Pending);
        assert_eq!(item.retry_count, 0);
        assert!(item.next_eligible_at.is_none());
        assert!(item.last_error.is_none());
    }

    #[tokio::test]
    async fn test_reprocess_rejects_non_terminal() {
        let (queue, _, _) = owned_queue().await;

        let id = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        let result = queue.reprocess(id).await;
        assert!(matches!(
            result,
            Err(SyncError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_variants() {
        let (queue, _, _) = owned_queue().await;

        let a = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();
        let b = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();
        let _c = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        queue.update_status(a, OperationStatus::Completed, None).await;
        queue.update_status(b, OperationStatus::Discarded, None).await;

        assert_eq!(queue.clear_completed().await, 1);
        assert_eq!(queue.clear_discarded().await, 1);
        assert_eq!(queue.len().await, 1);
        assert_eq!(queue.clear_all().await, 1);
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let (queue, _, _) = owned_queue().await;

        let a = queue
            .enqueue(OperationKind::Create, "m", json!({}), options(Priority::Critical))
            .await
            .unwrap();
        queue
            .enqueue(OperationKind::Create, "m", json!({}), options(Priority::Normal))
            .await
            .unwrap();
        queue.update_status(a, OperationStatus::Completed, None).await;

        let summary = queue.summary().await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.normal, 1);
    }

    #[tokio::test]
    async fn test_restore_demotes_processing_and_sorts() {
        let (queue, store, clock) = owned_queue().await;

        let first = queue
            .enqueue(OperationKind::Create, "m", json!(1), options(Priority::Normal))
            .await
            .unwrap();
        clock.advance_millis(10);
        let second = queue
            .enqueue(OperationKind::Create, "m", json!(2), options(Priority::Critical))
            .await
            .unwrap();
        queue.update_status(first, OperationStatus::Processing, None).await;

        // Fresh queue over the same store simulates a restart
        let restarted = OperationQueue::new(
            store,
            clock.clone(),
            Arc::new(SyncMetrics::new()),
            None,
        );
        let count = restarted.restore().await.unwrap();
        assert_eq!(count, 2);

        let items = restarted.ready_items().await;
        assert_eq!(items[0].id, second);
        assert_eq!(items[1].id, first);
        assert_eq!(items[1].status, OperationStatus::Pending);
    }

    #[tokio::test]
    async fn test_restore_skips_unparseable_entries() {
        let (queue, store, _) = owned_queue().await;
        queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        store
            .write_one(QUEUE_COLLECTION, "junk", &json!({"not": "an item"}))
            .await
            .unwrap();

        let count = queue.restore().await.unwrap();
        assert_eq!(count, 1);
    }

    struct FailingStore;

    #[async_trait]
    impl CollectionStore for FailingStore {
        async fn write_all(&self, _collection: &str, _items: &[Value]) -> bridge_traits::error::Result<()> {
            Err(BridgeError::Storage("disk full".to_string()))
        }

        async fn write_one(
            &self,
            _collection: &str,
            _key: &str,
            _item: &Value,
        ) -> bridge_traits::error::Result<()> {
            Err(BridgeError::Storage("disk full".to_string()))
        }

        async fn read_all(&self, _collection: &str) -> bridge_traits::error::Result<Vec<Value>> {
            Err(BridgeError::Storage("disk full".to_string()))
        }

        async fn read_one(
            &self,
            _collection: &str,
            _key: &str,
        ) -> bridge_traits::error::Result<Option<Value>> {
            Err(BridgeError::Storage("disk full".to_string()))
        }

        async fn clear(&self, _collection: &str) -> bridge_traits::error::Result<()> {
            Err(BridgeError::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_authoritative() {
        let queue = OperationQueue::new(
            Arc::new(FailingStore),
            Arc::new(ManualClock::starting_now()),
            Arc::new(SyncMetrics::new()),
            None,
        );
        queue.set_owner(Some("patient-1".to_string())).await;

        let id = queue
            .enqueue(OperationKind::Create, "m", json!({}), EnqueueOptions::default())
            .await
            .unwrap();

        assert_eq!(queue.len().await, 1);
        assert!(queue.get_item(id).await.is_some());
    }
}
