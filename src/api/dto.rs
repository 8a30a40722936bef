use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::models::{StoredReading, STATUS_NO_DATA, STATUS_UNDETECTED};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Request body for `POST /api/sensor`.
///
/// The three required fields accept any JSON value — a reading of `0` is
/// valid data, and so is an explicit `null`. Only an absent key fails
/// validation, which is why they go through [`present`] instead of a plain
/// `Option` (serde would fold `null` into `None`).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorSubmission {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub temperature: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub level_percent: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub ntu: Option<Value>,
    #[serde(default)]
    pub level_status: Option<String>,
    #[serde(default)]
    pub turb_status: Option<String>,
}

/// Deserialize any value, including `null`, as present.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SensorSubmission {
    /// True when any of `temperature`, `levelPercent`, `ntu` was absent
    /// from the request body.
    pub fn missing_required(&self) -> bool {
        self.temperature.is_none() || self.level_percent.is_none() || self.ntu.is_none()
    }

    /// Build the record persisted to both projections. `timestamp_ms` is
    /// server-assigned; omitted statuses get the sentinel.
    pub fn into_stored(self, timestamp_ms: i64) -> StoredReading {
        StoredReading {
            temperature: self.temperature,
            level_percent: self.level_percent,
            ntu: self.ntu,
            level_status: Some(status_or_undetected(self.level_status)),
            turb_status: Some(status_or_undetected(self.turb_status)),
            timestamp: Some(timestamp_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Fully-populated reading as served by the read endpoints: present values
/// pass through unchanged, absent ones are substituted so dashboards never
/// have to branch on missing fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingDto {
    #[schema(value_type = Object)]
    pub temperature: Value,
    #[schema(value_type = Object)]
    pub level_percent: Value,
    #[schema(value_type = Object)]
    pub ntu: Value,
    pub level_status: String,
    pub turb_status: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

impl ReadingDto {
    /// The normalization applied to every record leaving the store: absent
    /// numeric fields default to `0`, absent statuses to the sentinel, an
    /// absent timestamp to `now_ms`.
    pub fn from_stored(stored: StoredReading, now_ms: i64) -> Self {
        Self {
            temperature: stored.temperature.unwrap_or_else(zero),
            level_percent: stored.level_percent.unwrap_or_else(zero),
            ntu: stored.ntu.unwrap_or_else(zero),
            level_status: status_or_undetected(stored.level_status),
            turb_status: status_or_undetected(stored.turb_status),
            timestamp: stored.timestamp.unwrap_or(now_ms),
        }
    }

    /// Placeholder served before any device has ever reported.
    pub fn no_data(now_ms: i64) -> Self {
        Self {
            temperature: zero(),
            level_percent: zero(),
            ntu: zero(),
            level_status: STATUS_NO_DATA.to_owned(),
            turb_status: STATUS_NO_DATA.to_owned(),
            timestamp: now_ms,
        }
    }
}

/// One history endpoint row: store key plus the normalized record.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryDto {
    pub id: String,
    #[serde(flatten)]
    pub reading: ReadingDto,
}

/// 404 body of the latest endpoint: an informational message wrapped
/// around a usable placeholder record.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoDataResponse {
    #[schema(value_type = String)]
    pub message: &'static str,
    #[serde(flatten)]
    pub reading: ReadingDto,
}

fn status_or_undetected(status: Option<String>) -> String {
    status.unwrap_or_else(|| STATUS_UNDETECTED.to_owned())
}

fn zero() -> Value {
    Value::from(0)
}
