//! In-Memory Storage Implementations
//!
//! `HashMap`-backed implementations of the storage bridges. Nothing survives
//! a process restart; these exist for tests and for hosts that accept
//! volatile queues (e.g. short-lived tooling).

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    store::{CollectionStore, SettingsStore},
};
use serde_json::Value;
use tokio::sync::Mutex;

/// In-memory collection store.
///
/// Collections are `BTreeMap`s keyed by document key so `read_all` returns
/// documents in a deterministic order.
#[derive(Default)]
pub struct MemoryCollectionStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn write_all(&self, collection: &str, items: &[Value]) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| (document_key(item, index), item.clone()))
            .collect();
        collections.insert(collection.to_string(), entries);
        Ok(())
    }

    async fn write_one(&self, collection: &str, key: &str, item: &Value) -> Result<()> {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), item.clone());
        Ok(())
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Value>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn read_one(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.get(key).cloned()))
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.lock().await;
        collections.remove(collection);
        Ok(())
    }
}

/// Derive a document key from an item's `id` field, falling back to the
/// positional index for documents without one.
fn document_key(item: &Value, index: usize) -> String {
    item.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| index.to_string())
}

/// Typed value slot for the in-memory settings store.
#[derive(Debug, Clone, PartialEq)]
enum Stored {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

/// In-memory settings store.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, Stored>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), Stored::Text(value.to_string()));
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.values.lock().await.get(key) {
            Some(Stored::Text(v)) => Some(v.clone()),
            _ => None,
        })
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), Stored::Flag(value));
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(match self.values.lock().await.get(key) {
            Some(Stored::Flag(v)) => Some(*v),
            _ => None,
        })
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), Stored::Integer(value));
        Ok(())
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(match self.values.lock().await.get(key) {
            Some(Stored::Integer(v)) => Some(*v),
            _ => None,
        })
    }

    async fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), Stored::Float(value));
        Ok(())
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        Ok(match self.values.lock().await.get(key) {
            Some(Stored::Float(v)) => Some(*v),
            _ => None,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().await.contains_key(key))
    }

    async fn clear_all(&self) -> Result<()> {
        self.values.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_collection_round_trip() {
        let store = MemoryCollectionStore::new();
        let items = vec![json!({"id": "a", "n": 1}), json!({"id": "b", "n": 2})];

        store.write_all("queue", &items).await.unwrap();
        assert_eq!(store.len("queue").await, 2);

        let read = store.read_all("queue").await.unwrap();
        assert_eq!(read.len(), 2);

        let one = store.read_one("queue", "b").await.unwrap();
        assert_eq!(one, Some(json!({"id": "b", "n": 2})));
    }

    #[tokio::test]
    async fn test_write_all_replaces_contents() {
        let store = MemoryCollectionStore::new();
        store
            .write_all("queue", &[json!({"id": "a"}), json!({"id": "b"})])
            .await
            .unwrap();
        store.write_all("queue", &[json!({"id": "c"})]).await.unwrap();

        let read = store.read_all("queue").await.unwrap();
        assert_eq!(read, vec![json!({"id": "c"})]);
    }

    #[tokio::test]
    async fn test_clear_removes_collection() {
        let store = MemoryCollectionStore::new();
        store.write_one("queue", "a", &json!({"id": "a"})).await.unwrap();
        store.clear("queue").await.unwrap();

        assert!(store.is_empty("queue").await);
        assert!(store.read_all("queue").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_collection_reads_empty() {
        let store = MemoryCollectionStore::new();
        assert!(store.read_all("missing").await.unwrap().is_empty());
        assert_eq!(store.read_one("missing", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settings_typed_round_trip() {
        let store = MemorySettingsStore::new();

        store.set_string("s", "hello").await.unwrap();
        store.set_i64("i", 42).await.unwrap();
        store.set_f64("f", 2.5).await.unwrap();
        store.set_bool("b", true).await.unwrap();

        assert_eq!(store.get_string("s").await.unwrap(), Some("hello".into()));
        assert_eq!(store.get_i64("i").await.unwrap(), Some(42));
        assert_eq!(store.get_f64("f").await.unwrap(), Some(2.5));
        assert_eq!(store.get_bool("b").await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_settings_type_mismatch_reads_none() {
        let store = MemorySettingsStore::new();
        store.set_i64("key", 7).await.unwrap();
        assert_eq!(store.get_string("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settings_delete_and_has_key() {
        let store = MemorySettingsStore::new();
        store.set_bool("flag", false).await.unwrap();
        assert!(store.has_key("flag").await.unwrap());

        store.delete("flag").await.unwrap();
        assert!(!store.has_key("flag").await.unwrap());
    }
}
