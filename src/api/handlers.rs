use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::{error, info};
use utoipa::OpenApi;

use super::{
    dto::{HistoryEntryDto, NoDataResponse, ReadingDto, SensorSubmission},
    errors::ApiError,
    ApiContext,
};
use crate::store::models::HISTORY_WINDOW;

// Wire messages are part of the deployed dashboard contract.
const MSG_INCOMPLETE: &str = "Data tidak lengkap / format salah";
const MSG_STORED: &str = "Data sensor diterima dan disimpan ke Firebase!";
const MSG_STORE_WRITE_FAILED: &str = "Gagal menyimpan data ke Firebase.";
const MSG_NO_DATA_YET: &str = "Belum ada data sensor";
const MSG_LATEST_READ_FAILED: &str = "Gagal mengambil data dari Firebase";
const MSG_HISTORY_READ_FAILED: &str = "Gagal mengambil history dari Firebase";
const MSG_PROBE_OK: &str = "Firebase connection successful";
const MSG_PROBE_FAILED: &str = "Firebase connection failed";

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Service metadata: liveness flag, server time and store identity.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running"),
    ),
    tag = "system"
)]
pub async fn health(State(ctx): State<ApiContext>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Backend Monitoring Tambak API",
        "status": "running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "firebase": {
            "project": ctx.project_id,
            "connected": true,
        },
    }))
}

/// Ingest one reading pushed by the device: validate, stamp, then write the
/// latest slot and the history entry as two concurrent store operations.
#[utoipa::path(
    post,
    path = "/api/sensor",
    request_body = SensorSubmission,
    responses(
        (status = 200, description = "Reading stored in both projections"),
        (status = 400, description = "Missing required field"),
        (status = 500, description = "Store write failed"),
    ),
    tag = "sensors"
)]
pub async fn submit_reading(
    State(ctx): State<ApiContext>,
    Json(submission): Json<SensorSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!(
        temperature = ?submission.temperature,
        level_percent = ?submission.level_percent,
        ntu = ?submission.ntu,
        level_status = ?submission.level_status,
        turb_status = ?submission.turb_status,
        "Sensor submission received"
    );

    if submission.missing_required() {
        return Err(ApiError::Validation(MSG_INCOMPLETE));
    }

    let reading = submission.into_stored(Utc::now().timestamp_millis());

    // Both writes must settle before the device gets its acknowledgement;
    // there is no ordering between them and no compensation on failure.
    tokio::try_join!(
        ctx.store.set_latest(&reading),
        ctx.store.append_history(&reading),
    )
    .map_err(|e| {
        error!(error = %e, "Store write failed");
        ApiError::store(MSG_STORE_WRITE_FAILED, e)
    })?;

    Ok(Json(json!({ "message": MSG_STORED })))
}

/// Serve the latest reading, normalized. An empty slot yields a 404 whose
/// body is still a fully-populated record.
#[utoipa::path(
    get,
    path = "/api/sensor/latest",
    responses(
        (status = 200, description = "Normalized latest reading", body = ReadingDto),
        (status = 404, description = "No device has reported yet", body = NoDataResponse),
        (status = 500, description = "Store read failed"),
    ),
    tag = "sensors"
)]
pub async fn get_latest(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let stored = ctx
        .store
        .get_latest()
        .await
        .map_err(|e| ApiError::store(MSG_LATEST_READ_FAILED, e))?;

    let now_ms = Utc::now().timestamp_millis();
    Ok(match stored {
        Some(stored) => Json(ReadingDto::from_stored(stored, now_ms)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(NoDataResponse {
                message: MSG_NO_DATA_YET,
                reading: ReadingDto::no_data(now_ms),
            }),
        )
            .into_response(),
    })
}

/// Serve the last [`HISTORY_WINDOW`] readings sorted ascending by
/// timestamp. An empty collection is a normal state, not an error.
#[utoipa::path(
    get,
    path = "/api/sensor/history",
    responses(
        (status = 200, description = "Ordered history window", body = Vec<HistoryEntryDto>),
        (status = 500, description = "Store read failed"),
    ),
    tag = "sensors"
)]
pub async fn get_history(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<HistoryEntryDto>>, ApiError> {
    let entries = ctx
        .store
        .query_last_n(HISTORY_WINDOW)
        .await
        .map_err(|e| ApiError::store(MSG_HISTORY_READ_FAILED, e))?;

    let now_ms = Utc::now().timestamp_millis();
    let mut rows: Vec<HistoryEntryDto> = entries
        .into_iter()
        .map(|entry| HistoryEntryDto {
            id: entry.id,
            reading: ReadingDto::from_stored(entry.reading, now_ms),
        })
        .collect();

    // Store key order is not guaranteed chronological. The sort is stable,
    // so entries with equal timestamps keep the store order.
    rows.sort_by_key(|row| row.reading.timestamp);

    info!(count = rows.len(), "Serving history window");
    Ok(Json(rows))
}

/// Store connectivity probe: write-then-read round trip on a scratch node.
#[utoipa::path(
    get,
    path = "/api/debug",
    responses(
        (status = 200, description = "Store round trip succeeded"),
        (status = 500, description = "Store round trip failed"),
    ),
    tag = "system"
)]
pub async fn debug_store(
    State(ctx): State<ApiContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let data = ctx
        .store
        .probe()
        .await
        .map_err(|e| ApiError::store(MSG_PROBE_FAILED, e))?;

    Ok(Json(json!({ "message": MSG_PROBE_OK, "data": data })))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(health, submit_reading, get_latest, get_history, debug_store),
    components(schemas(SensorSubmission, ReadingDto, HistoryEntryDto, NoDataResponse)),
    tags(
        (name = "sensors", description = "Sensor ingestion and query endpoints"),
        (name = "system",  description = "Service health and diagnostics"),
    ),
    info(
        title = "Tambak Monitoring API",
        version = "0.1.0",
        description = "REST API for pond sensor ingestion and dashboards"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
