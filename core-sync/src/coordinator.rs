//! # Sync Coordinator
//!
//! Single entry point tying the sync engine together.
//!
//! ## Overview
//!
//! The coordinator owns the queue, handler registry, processor, scheduler,
//! conflict resolver, change broadcaster, metrics, and persisted settings,
//! and exposes them behind one facade. Hosts construct it over the bridge
//! traits (collection store, settings store, connectivity monitor, clock)
//! and an event bus, then drive everything through its methods.
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = SyncCoordinator::new(store, settings, monitor, clock, bus).await;
//! coordinator.set_owner(Some("user-1".to_string())).await;
//! coordinator.restore().await?;
//! coordinator.start().await;
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bridge_traits::connectivity::ConnectivityMonitor;
use bridge_traits::store::{CollectionStore, SettingsStore};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::events::{EventBus, EventStream};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::broadcast::{ApplyDecision, ChangeBroadcaster, ChangeEnvelope, DeviceId};
use crate::conflict::{
    ConflictId, ConflictResolver, ConflictStrategy, DocumentVersion, Resolution, SyncConflict,
};
use crate::error::Result;
use crate::handler::{HandlerRegistry, OperationHandler};
use crate::item::{EnqueueOptions, OperationId, OperationKind, OperationStatus, Priority, QueueItem};
use crate::metrics::{MetricsSnapshot, SyncMetrics};
use crate::processor::{PassReport, QueueProcessor};
use crate::queue::{OperationQueue, QueueSummary};
use crate::scheduler::SyncScheduler;
use crate::settings::SyncSettings;

/// Facade over the whole sync engine
pub struct SyncCoordinator {
    queue: Arc<OperationQueue>,
    registry: Arc<RwLock<HandlerRegistry>>,
    processor: Arc<QueueProcessor>,
    resolver: ConflictResolver,
    broadcaster: ChangeBroadcaster,
    metrics: Arc<SyncMetrics>,
    settings_store: Arc<dyn SettingsStore>,
    settings: RwLock<SyncSettings>,
    monitor: Arc<dyn ConnectivityMonitor>,
    scheduler: tokio::sync::Mutex<Option<SyncScheduler>>,
    event_bus: EventBus,
}

impl SyncCoordinator {
    /// Build the engine over the host bridges.
    ///
    /// Loads persisted settings and the persisted conflict strategy; the
    /// queue itself is reloaded separately through [`restore`](Self::restore).
    pub async fn new(
        store: Arc<dyn CollectionStore>,
        settings_store: Arc<dyn SettingsStore>,
        monitor: Arc<dyn ConnectivityMonitor>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        let settings = SyncSettings::load(&settings_store).await;
        let metrics = Arc::new(SyncMetrics::new());

        let queue = Arc::new(OperationQueue::new(
            store,
            clock.clone(),
            metrics.clone(),
            Some(event_bus.clone()),
        ));
        let registry = Arc::new(RwLock::new(HandlerRegistry::new()));
        let processor = Arc::new(QueueProcessor::new(
            queue.clone(),
            registry.clone(),
            settings.backoff_policy(),
            clock.clone(),
            metrics.clone(),
            Arc::new(AtomicBool::new(false)),
            Some(event_bus.clone()),
        ));

        processor.set_online(monitor.is_online().await);

        let resolver = ConflictResolver::new(
            settings_store.clone(),
            clock.clone(),
            Some(event_bus.clone()),
        );
        resolver.load_default_strategy().await;

        info!(
            max_retries = settings.max_retries,
            process_interval_ms = settings.process_interval_ms,
            "Sync coordinator initialized"
        );

        Self {
            queue,
            registry,
            processor,
            resolver,
            broadcaster: ChangeBroadcaster::new(),
            metrics,
            settings_store,
            settings: RwLock::new(settings),
            monitor,
            scheduler: tokio::sync::Mutex::new(None),
            event_bus,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the background scheduler with the current timer settings.
    ///
    /// Idempotent; a second call while running is a no-op.
    pub async fn start(&self) {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_some() {
            warn!("Scheduler already running");
            return;
        }
        let config = self.settings.read().await.timer_config();
        *scheduler = Some(SyncScheduler::start(
            self.processor.clone(),
            self.queue.clone(),
            self.monitor.clone(),
            config,
        ));
    }

    /// Stop the background scheduler, waiting for its task to exit
    pub async fn shutdown(&self) {
        let taken = self.scheduler.lock().await.take();
        if let Some(scheduler) = taken {
            scheduler.shutdown().await;
        }
    }

    /// Reload the persisted queue after a restart. Returns the item count.
    pub async fn restore(&self) -> Result<usize> {
        self.queue.restore().await
    }

    /// Stream of engine events for host-side observation
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    /// Set or clear the authenticated owner gating queue admission
    pub async fn set_owner(&self, owner: Option<String>) {
        self.queue.set_owner(owner).await;
    }

    /// Admit an operation into the queue.
    ///
    /// Options that leave `max_retries` unset inherit the configured budget.
    pub async fn enqueue(
        &self,
        kind: OperationKind,
        collection: &str,
        payload: Value,
        mut options: EnqueueOptions,
    ) -> Result<OperationId> {
        if options.max_retries.is_none() {
            options.max_retries = Some(self.settings.read().await.max_retries);
        }
        self.queue.enqueue(kind, collection, payload, options).await
    }

    /// Remove an operation unconditionally. Returns whether it existed.
    pub async fn dequeue(&self, id: OperationId) -> bool {
        self.queue.dequeue(id).await
    }

    pub async fn get_item(&self, id: OperationId) -> Option<QueueItem> {
        self.queue.get_item(id).await
    }

    pub async fn items_by_status(&self, status: OperationStatus) -> Vec<QueueItem> {
        self.queue.items_by_status(status).await
    }

    pub async fn items_by_priority(&self, priority: Priority) -> Vec<QueueItem> {
        self.queue.items_by_priority(priority).await
    }

    /// Run one processing pass if online; zeroed report otherwise
    pub async fn process_queue(&self) -> PassReport {
        self.processor.process_queue().await
    }

    /// Run one pass now; offline is an explicit error
    pub async fn force_process(&self) -> Result<PassReport> {
        self.processor.force_process().await
    }

    /// Return a discarded or failed operation to Pending
    pub async fn reprocess(&self, id: OperationId) -> Result<()> {
        self.queue.reprocess(id).await
    }

    pub async fn queue_summary(&self) -> QueueSummary {
        self.queue.summary().await
    }

    pub async fn clear_completed(&self) -> usize {
        self.queue.clear_completed().await
    }

    pub async fn clear_discarded(&self) -> usize {
        self.queue.clear_discarded().await
    }

    pub async fn clear_all(&self) -> usize {
        self.queue.clear_all().await
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Register a handler for a kind across collections; `"*"` is the
    /// per-kind fallback
    pub async fn register_handler(
        &self,
        kind: OperationKind,
        collections: &[&str],
        handler: Arc<dyn OperationHandler>,
    ) {
        self.registry.write().await.register(kind, collections, handler);
    }

    /// Remove handler registrations
    pub async fn unregister_handler(&self, kind: OperationKind, collections: &[&str]) {
        self.registry.write().await.unregister(kind, collections);
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    // ========================================================================
    // Conflicts
    // ========================================================================

    /// Compare two versions of a document, recording a conflict when they
    /// genuinely diverge
    pub async fn detect_conflict(
        &self,
        local: &DocumentVersion,
        server: &DocumentVersion,
    ) -> Option<SyncConflict> {
        self.resolver.detect(local, server).await
    }

    /// Resolve a recorded conflict with an optional strategy override
    pub async fn resolve_conflict(
        &self,
        conflict_id: ConflictId,
        strategy_override: Option<ConflictStrategy>,
    ) -> Result<Resolution> {
        self.resolver.resolve(conflict_id, strategy_override).await
    }

    /// Change and persist the default resolution strategy
    pub async fn set_default_strategy(&self, strategy: ConflictStrategy) {
        self.resolver.set_default_strategy(strategy).await;
    }

    pub async fn default_strategy(&self) -> ConflictStrategy {
        self.resolver.default_strategy().await
    }

    pub async fn unresolved_conflicts(&self) -> Vec<SyncConflict> {
        self.resolver.unresolved().await
    }

    pub async fn clear_resolved_conflicts(&self) -> usize {
        self.resolver.clear_resolved().await
    }

    // ========================================================================
    // Device broadcast
    // ========================================================================

    pub fn device_id(&self) -> DeviceId {
        self.broadcaster.device_id()
    }

    /// Wrap an outgoing change with a fresh echo-suppression token
    pub fn originate_change(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
        modified_at: DateTime<Utc>,
    ) -> ChangeEnvelope {
        self.broadcaster
            .originate(collection, document_id, data, modified_at)
    }

    /// Decide whether an incoming cross-device change applies locally
    pub fn evaluate_change(
        &self,
        incoming: &ChangeEnvelope,
        local_modified_at: Option<DateTime<Utc>>,
    ) -> ApplyDecision {
        self.broadcaster.evaluate(incoming, local_modified_at)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn settings(&self) -> SyncSettings {
        self.settings.read().await.clone()
    }

    /// Apply and persist new settings.
    ///
    /// The backoff policy takes effect on the next failure and the timer is
    /// reconfigured in place when the scheduler is running.
    pub async fn update_settings(&self, new_settings: SyncSettings) {
        new_settings.persist(&self.settings_store).await;
        self.processor.set_backoff(new_settings.backoff_policy());

        if let Some(scheduler) = self.scheduler.lock().await.as_ref() {
            scheduler.configure_timer(
                new_settings.process_interval_ms,
                new_settings.auto_process_enabled,
            );
        }

        let mut settings = self.settings.write().await;
        *settings = new_settings;
        info!(
            max_retries = settings.max_retries,
            process_interval_ms = settings.process_interval_ms,
            auto_process_enabled = settings.auto_process_enabled,
            "Sync settings updated"
        );
    }

    /// Drop persisted overrides and return to defaults
    pub async fn reset_settings(&self) {
        SyncSettings::reset(&self.settings_store).await;
        let defaults = SyncSettings::default();
        self.processor.set_backoff(defaults.backoff_policy());

        if let Some(scheduler) = self.scheduler.lock().await.as_ref() {
            scheduler.configure_timer(
                defaults.process_interval_ms,
                defaults.auto_process_enabled,
            );
        }

        let mut settings = self.settings.write().await;
        *settings = defaults;
    }
}
