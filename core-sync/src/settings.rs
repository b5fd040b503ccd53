//! # Persisted Sync Settings
//!
//! Runtime tunables for retry behavior and the automatic processing timer,
//! stored flat under `sync.*` keys in the host settings store.
//!
//! Every accessor is best-effort: a missing or unreadable key falls back to
//! its default, and a failed write is logged while the in-memory value stays
//! correct.

use std::sync::Arc;

use bridge_traits::store::SettingsStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backoff::{
    BackoffPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MULTIPLIER,
};
use crate::queue::DEFAULT_MAX_RETRIES;
use crate::scheduler::{TimerConfig, DEFAULT_PROCESS_INTERVAL_MS};

const KEY_MAX_RETRIES: &str = "sync.max_retries";
const KEY_BASE_DELAY_MS: &str = "sync.base_delay_ms";
const KEY_MAX_DELAY_MS: &str = "sync.max_delay_ms";
const KEY_BACKOFF_MULTIPLIER: &str = "sync.backoff_multiplier";
const KEY_AUTO_PROCESS_ENABLED: &str = "sync.auto_process_enabled";
const KEY_PROCESS_INTERVAL_MS: &str = "sync.process_interval_ms";

const ALL_KEYS: &[&str] = &[
    KEY_MAX_RETRIES,
    KEY_BASE_DELAY_MS,
    KEY_MAX_DELAY_MS,
    KEY_BACKOFF_MULTIPLIER,
    KEY_AUTO_PROCESS_ENABLED,
    KEY_PROCESS_INTERVAL_MS,
];

/// Runtime sync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Retry budget applied to new queue items
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Cap on the deterministic backoff component
    pub max_delay_ms: u64,
    /// Backoff growth factor
    pub backoff_multiplier: f64,
    /// Whether the periodic processing timer runs
    pub auto_process_enabled: bool,
    /// Period of the processing timer in milliseconds
    pub process_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_MULTIPLIER,
            auto_process_enabled: true,
            process_interval_ms: DEFAULT_PROCESS_INTERVAL_MS,
        }
    }
}

impl SyncSettings {
    /// Load settings, falling back to defaults key by key
    pub async fn load(store: &Arc<dyn SettingsStore>) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: read_u32(store, KEY_MAX_RETRIES, defaults.max_retries).await,
            base_delay_ms: read_u64(store, KEY_BASE_DELAY_MS, defaults.base_delay_ms).await,
            max_delay_ms: read_u64(store, KEY_MAX_DELAY_MS, defaults.max_delay_ms).await,
            backoff_multiplier: read_f64(
                store,
                KEY_BACKOFF_MULTIPLIER,
                defaults.backoff_multiplier,
            )
            .await,
            auto_process_enabled: read_bool(
                store,
                KEY_AUTO_PROCESS_ENABLED,
                defaults.auto_process_enabled,
            )
            .await,
            process_interval_ms: read_u64(
                store,
                KEY_PROCESS_INTERVAL_MS,
                defaults.process_interval_ms,
            )
            .await,
        }
    }

    /// Write all settings; failures are logged and ignored
    pub async fn persist(&self, store: &Arc<dyn SettingsStore>) {
        write(store.set_i64(KEY_MAX_RETRIES, self.max_retries as i64).await, KEY_MAX_RETRIES);
        write(
            store.set_i64(KEY_BASE_DELAY_MS, self.base_delay_ms as i64).await,
            KEY_BASE_DELAY_MS,
        );
        write(
            store.set_i64(KEY_MAX_DELAY_MS, self.max_delay_ms as i64).await,
            KEY_MAX_DELAY_MS,
        );
        write(
            store.set_f64(KEY_BACKOFF_MULTIPLIER, self.backoff_multiplier).await,
            KEY_BACKOFF_MULTIPLIER,
        );
        write(
            store
                .set_bool(KEY_AUTO_PROCESS_ENABLED, self.auto_process_enabled)
                .await,
            KEY_AUTO_PROCESS_ENABLED,
        );
        write(
            store
                .set_i64(KEY_PROCESS_INTERVAL_MS, self.process_interval_ms as i64)
                .await,
            KEY_PROCESS_INTERVAL_MS,
        );
    }

    /// Delete every persisted override key
    pub async fn reset(store: &Arc<dyn SettingsStore>) {
        for key in ALL_KEYS {
            if let Err(e) = store.delete(key).await {
                warn!(key = *key, error = %e, "Failed to delete sync setting");
            }
        }
    }

    /// Backoff policy derived from these settings
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base_delay_ms: self.base_delay_ms,
            multiplier: self.backoff_multiplier,
            max_delay_ms: self.max_delay_ms,
            ..BackoffPolicy::default()
        }
    }

    /// Timer configuration derived from these settings
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            interval_ms: self.process_interval_ms,
            enabled: self.auto_process_enabled,
        }
    }
}

fn write(result: bridge_traits::error::Result<()>, key: &str) {
    if let Err(e) = result {
        warn!(key = key, error = %e, "Failed to persist sync setting");
    }
}

async fn read_u32(store: &Arc<dyn SettingsStore>, key: &str, default: u32) -> u32 {
    match store.get_i64(key).await {
        Ok(Some(v)) if v >= 0 => v as u32,
        Ok(_) => default,
        Err(e) => {
            warn!(key = key, error = %e, "Failed to read sync setting");
            default
        }
    }
}

async fn read_u64(store: &Arc<dyn SettingsStore>, key: &str, default: u64) -> u64 {
    match store.get_i64(key).await {
        Ok(Some(v)) if v >= 0 => v as u64,
        Ok(_) => default,
        Err(e) => {
            warn!(key = key, error = %e, "Failed to read sync setting");
            default
        }
    }
}

async fn read_f64(store: &Arc<dyn SettingsStore>, key: &str, default: f64) -> f64 {
    match store.get_f64(key).await {
        Ok(Some(v)) if v > 0.0 => v,
        Ok(_) => default,
        Err(e) => {
            warn!(key = key, error = %e, "Failed to read sync setting");
            default
        }
    }
}

async fn read_bool(store: &Arc<dyn SettingsStore>, key: &str, default: bool) -> bool {
    match store.get_bool(key).await {
        Ok(Some(v)) => v,
        Ok(None) => default,
        Err(e) => {
            warn!(key = key, error = %e, "Failed to read sync setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_memory::MemorySettingsStore;

    fn store() -> Arc<dyn SettingsStore> {
        Arc::new(MemorySettingsStore::new())
    }

    #[tokio::test]
    async fn test_load_defaults_from_empty_store() {
        let store = store();
        let settings = SyncSettings::load(&store).await;
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.base_delay_ms, 1_000);
        assert_eq!(settings.max_delay_ms, 60_000);
        assert_eq!(settings.backoff_multiplier, 2.0);
        assert!(settings.auto_process_enabled);
        assert_eq!(settings.process_interval_ms, 5_000);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = store();
        let settings = SyncSettings {
            max_retries: 5,
            base_delay_ms: 250,
            max_delay_ms: 30_000,
            backoff_multiplier: 1.5,
            auto_process_enabled: false,
            process_interval_ms: 10_000,
        };

        settings.persist(&store).await;
        let loaded = SyncSettings::load(&store).await;
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_reset_removes_overrides() {
        let store = store();
        let settings = SyncSettings {
            max_retries: 9,
            ..SyncSettings::default()
        };
        settings.persist(&store).await;

        SyncSettings::reset(&store).await;
        assert!(!store.has_key(KEY_MAX_RETRIES).await.unwrap());
        assert_eq!(SyncSettings::load(&store).await, SyncSettings::default());
    }

    #[tokio::test]
    async fn test_derived_configs() {
        let settings = SyncSettings {
            base_delay_ms: 100,
            max_delay_ms: 400,
            backoff_multiplier: 2.0,
            process_interval_ms: 1_000,
            auto_process_enabled: false,
            ..SyncSettings::default()
        };

        let policy = settings.backoff_policy();
        assert_eq!(policy.base_delay_for(0), 100);
        assert_eq!(policy.base_delay_for(5), 400);

        let timer = settings.timer_config();
        assert_eq!(timer.interval_ms, 1_000);
        assert!(!timer.enabled);
    }
}
