//! End-to-end tests for the sync engine running over the in-memory bridges.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_memory::{
    ManualClock, ManualConnectivityMonitor, MemoryCollectionStore, MemorySettingsStore,
};
use bridge_traits::connectivity::{
    ConnectivityChangeStream, ConnectivityMonitor, ConnectivityStatus,
};
use bridge_traits::error::BridgeError;
use core_runtime::events::EventBus;
use core_sync::{
    EnqueueOptions, OperationHandler, OperationId, OperationKind, OperationStatus, QueueItem,
    Result, SyncCoordinator, SyncError, SyncSettings,
};
use serde_json::json;

struct OkHandler;

#[async_trait]
impl OperationHandler for OkHandler {
    async fn execute(&self, _item: &QueueItem) -> Result<bool> {
        Ok(true)
    }
}

async fn coordinator_with(monitor: Arc<dyn ConnectivityMonitor>) -> SyncCoordinator {
    let coordinator = SyncCoordinator::new(
        Arc::new(MemoryCollectionStore::new()),
        Arc::new(MemorySettingsStore::new()),
        monitor,
        Arc::new(ManualClock::starting_now()),
        EventBus::default(),
    )
    .await;
    coordinator.set_owner(Some("owner-1".to_string())).await;
    coordinator
        .register_handler(OperationKind::Create, &["*"], Arc::new(OkHandler))
        .await;
    coordinator
}

async fn enqueue_one(coordinator: &SyncCoordinator) -> OperationId {
    coordinator
        .enqueue(
            OperationKind::Create,
            "medications",
            json!({"name": "aspirin"}),
            EnqueueOptions::default(),
        )
        .await
        .expect("enqueue failed")
}

async fn wait_for_completion(coordinator: &SyncCoordinator, id: OperationId) {
    for _ in 0..200 {
        let status = coordinator.get_item(id).await.map(|item| item.status);
        if status == Some(OperationStatus::Completed) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("operation {id} did not complete in time");
}

#[tokio::test]
async fn test_reconnect_triggers_processing_pass() {
    let monitor = Arc::new(ManualConnectivityMonitor::offline());
    let coordinator = coordinator_with(monitor.clone()).await;

    // Timer off so only the connectivity edge can trigger the pass
    coordinator
        .update_settings(SyncSettings {
            auto_process_enabled: false,
            ..SyncSettings::default()
        })
        .await;

    let id = enqueue_one(&coordinator).await;
    assert!(matches!(
        coordinator.force_process().await,
        Err(SyncError::Offline)
    ));

    coordinator.start().await;
    // Give the scheduler task time to subscribe before flipping the signal
    tokio::time::sleep(Duration::from_millis(50)).await;

    monitor.set_online(true);
    wait_for_completion(&coordinator, id).await;

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_timer_drives_processing_while_online() {
    let monitor = Arc::new(ManualConnectivityMonitor::online());
    let coordinator = coordinator_with(monitor).await;

    coordinator
        .update_settings(SyncSettings {
            process_interval_ms: 20,
            ..SyncSettings::default()
        })
        .await;

    let id = enqueue_one(&coordinator).await;
    coordinator.start().await;

    wait_for_completion(&coordinator, id).await;
    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_going_offline_stops_processing() {
    let monitor = Arc::new(ManualConnectivityMonitor::online());
    let coordinator = coordinator_with(monitor.clone()).await;

    coordinator.start().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    monitor.set_online(false);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let id = enqueue_one(&coordinator).await;
    assert!(matches!(
        coordinator.force_process().await,
        Err(SyncError::Offline)
    ));
    assert_eq!(
        coordinator.get_item(id).await.unwrap().status,
        OperationStatus::Pending
    );

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let monitor = Arc::new(ManualConnectivityMonitor::online());
    let coordinator = coordinator_with(monitor).await;

    coordinator.start().await;
    coordinator.shutdown().await;
    // A second shutdown with no scheduler running is a no-op
    coordinator.shutdown().await;
}

mod faulty_monitor {
    use super::*;
    use mockall::mock;

    mock! {
        Monitor {}

        #[async_trait]
        impl ConnectivityMonitor for Monitor {
            async fn status(&self) -> bridge_traits::error::Result<ConnectivityStatus>;
            async fn subscribe_changes(
                &self,
            ) -> bridge_traits::error::Result<Box<dyn ConnectivityChangeStream>>;
        }
    }

    #[tokio::test]
    async fn test_scheduler_degrades_to_timer_only() {
        let mut monitor = MockMonitor::new();
        monitor
            .expect_status()
            .returning(|| Ok(ConnectivityStatus::Online));
        monitor.expect_subscribe_changes().returning(|| {
            Err(BridgeError::NotAvailable(
                "no connectivity events on this host".to_string(),
            ))
        });

        let coordinator = coordinator_with(Arc::new(monitor)).await;
        coordinator
            .update_settings(SyncSettings {
                process_interval_ms: 20,
                ..SyncSettings::default()
            })
            .await;

        let id = enqueue_one(&coordinator).await;
        coordinator.start().await;

        // The timer keeps the queue draining even without edge events
        wait_for_completion(&coordinator, id).await;
        coordinator.shutdown().await;
    }
}
