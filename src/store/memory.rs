use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{HistoryEntry, StoredReading};
use super::SensorStore;

/// In-memory [`SensorStore`] backing the endpoint tests: a single
/// overwritten latest slot plus an insertion-ordered history list with
/// generated keys.
///
/// Wrapped in `Arc` so a test can keep a handle for assertions while the
/// server owns a clone of the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    latest: Option<StoredReading>,
    history: Vec<HistoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries currently held.
    pub async fn history_len(&self) -> usize {
        self.inner.read().await.history.len()
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn get_latest(&self) -> Result<Option<StoredReading>> {
        Ok(self.inner.read().await.latest.clone())
    }

    async fn set_latest(&self, reading: &StoredReading) -> Result<()> {
        self.inner.write().await.latest = Some(reading.clone());
        Ok(())
    }

    async fn append_history(&self, reading: &StoredReading) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.inner.write().await.history.push(HistoryEntry {
            id: id.clone(),
            reading: reading.clone(),
        });
        Ok(id)
    }

    async fn query_last_n(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        let inner = self.inner.read().await;
        let skip = inner.history.len().saturating_sub(n);
        Ok(inner.history[skip..].to_vec())
    }

    async fn probe(&self) -> Result<Value> {
        Ok(json!({ "test": "connection" }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reading(temperature: i64, timestamp: i64) -> StoredReading {
        StoredReading {
            temperature: Some(json!(temperature)),
            level_percent: Some(json!(50)),
            ntu: Some(json!(3)),
            level_status: Some("AMAN".to_owned()),
            turb_status: Some("Jernih".to_owned()),
            timestamp: Some(timestamp),
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_latest_and_no_history() {
        let store = MemoryStore::new();
        assert!(store.get_latest().await.unwrap().is_none());
        assert!(store.query_last_n(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_latest_overwrites_previous_value() {
        let store = MemoryStore::new();
        store.set_latest(&reading(20, 1000)).await.unwrap();
        store.set_latest(&reading(25, 2000)).await.unwrap();

        let latest = store.get_latest().await.unwrap().unwrap();
        assert_eq!(latest.temperature, Some(json!(25)));
    }

    #[tokio::test]
    async fn append_history_preserves_insertion_order_and_unique_ids() {
        let store = MemoryStore::new();
        let id1 = store.append_history(&reading(20, 1000)).await.unwrap();
        let id2 = store.append_history(&reading(21, 2000)).await.unwrap();
        assert_ne!(id1, id2);

        let entries = store.query_last_n(20).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, id1);
        assert_eq!(entries[1].id, id2);
    }

    #[tokio::test]
    async fn query_last_n_returns_only_the_tail() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.append_history(&reading(i, i * 1000)).await.unwrap();
        }

        let entries = store.query_last_n(3).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].reading.temperature, Some(json!(2)));
        assert_eq!(entries[2].reading.temperature, Some(json!(4)));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.append_history(&reading(20, 1000)).await.unwrap();
        assert_eq!(clone.history_len().await, 1);
    }
}
