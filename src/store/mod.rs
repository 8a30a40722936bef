pub mod models;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use models::{HistoryEntry, StoredReading};

/// Interface to the external document store holding the two projections of
/// a sensor reading: the single overwritten latest slot and the append-only
/// history collection.
///
/// Implementations are injected into the handlers at construction time;
/// nothing in the request path reaches for ambient store state.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Read the latest slot. `None` means no device has ever reported.
    async fn get_latest(&self) -> Result<Option<StoredReading>>;

    /// Unconditionally overwrite the latest slot.
    async fn set_latest(&self, reading: &StoredReading) -> Result<()>;

    /// Append to the history collection. Returns the store-generated key
    /// of the new entry.
    async fn append_history(&self, reading: &StoredReading) -> Result<String>;

    /// Last `n` history entries in store key order. Key order is the
    /// store's insertion sequencing and is not guaranteed chronological.
    async fn query_last_n(&self, n: usize) -> Result<Vec<HistoryEntry>>;

    /// Connectivity probe: a write-then-read round trip on a scratch node,
    /// returning whatever the store handed back.
    async fn probe(&self) -> Result<Value>;
}

/// Shared store handle as held by the HTTP layer.
pub type DynStore = Arc<dyn SensorStore>;
