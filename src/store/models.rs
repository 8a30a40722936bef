use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status string substituted when a device omits `levelStatus`/`turbStatus`.
pub const STATUS_UNDETECTED: &str = "Tidak Terdeteksi";

/// Status string carried by the placeholder served before any device has
/// ever reported.
pub const STATUS_NO_DATA: &str = "NO DATA";

/// Fixed number of history entries served by the history endpoint.
pub const HISTORY_WINDOW: usize = 20;

/// Sensor record as persisted in the store.
///
/// Every field is optional on read: records written by older backend
/// revisions may miss statuses or the timestamp, and the read path must
/// tolerate them. The write path always fills in every field. Submitted
/// values are kept as raw JSON — a reading of `0` (or a boolean from a
/// misbehaving firmware build) is stored exactly as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_percent: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntu: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turb_status: Option<String>,
    /// Milliseconds since epoch, assigned by the server at write time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// One entry of the history collection: the store-generated key plus the
/// raw record it points at.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: String,
    pub reading: StoredReading,
}
