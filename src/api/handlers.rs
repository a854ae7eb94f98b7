use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::OpenApi;

use super::{
    dto::{HistoryResponse, IngestResponse, LatestResponse, ReadingDto, StatsResponse},
    errors::ApiError,
    AppState,
};
use crate::{
    db::models::NewReading,
    query::Source,
    stats::Stats,
};

const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<u32>,
}

/// Ingest one reading: durable append, then write-through of the cached
/// latest value. The server assigns the timestamp.
#[utoipa::path(
    post,
    path = "/readings",
    request_body = NewReading,
    responses(
        (status = 200, description = "Reading persisted", body = IngestResponse),
        (status = 422, description = "Malformed reading rejected before any write"),
        (status = 503, description = "Durable store unavailable"),
    ),
    tag = "readings"
)]
pub async fn create_reading(
    State(state): State<AppState>,
    Json(body): Json<NewReading>,
) -> Result<Json<IngestResponse>, ApiError> {
    let reading = state.ingest.ingest(body).await?;
    Ok(Json(IngestResponse {
        status: "success".to_owned(),
        reading: reading.into(),
    }))
}

/// Latest reading for a sensor, from the cache only. `data` is `null` when
/// no fresh cache entry exists — there is no fallback read from the store.
#[utoipa::path(
    get,
    path = "/readings/latest/{sensor_id}",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Cached latest reading, or null", body = LatestResponse),
    ),
    tag = "readings"
)]
pub async fn get_latest_reading(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Json<LatestResponse> {
    let data = state.query.latest(&sensor_id).await;
    Json(LatestResponse {
        source: Source::Cache,
        data: data.map(ReadingDto::from),
    })
}

/// Historical readings over the trailing `hours` (default 24), newest
/// first. Always served live from the durable store.
#[utoipa::path(
    get,
    path = "/readings/history/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor ID"),
        ("hours" = Option<u32>, Query, description = "Trailing window in hours, default 24"),
    ),
    responses(
        (status = 200, description = "Readings in the window", body = HistoryResponse),
        (status = 503, description = "Durable store unavailable"),
    ),
    tag = "readings"
)]
pub async fn get_reading_history(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let hours = params.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let readings = state.query.history(&sensor_id, hours).await?;
    Ok(Json(HistoryResponse {
        sensor_id,
        count: readings.len(),
        readings: readings.into_iter().map(ReadingDto::from).collect(),
    }))
}

/// Trailing-hour aggregates for a sensor, cache-aside with a 60 s TTL.
#[utoipa::path(
    get,
    path = "/stats/{sensor_id}",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Aggregates, or a no-recent-data message", body = StatsResponse),
        (status = 503, description = "Durable store unavailable"),
    ),
    tag = "stats"
)]
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let response = match state.query.stats(&sensor_id).await? {
        Some((source, stats)) => StatsResponse::Ready { source, stats },
        None => StatsResponse::NoRecentData {
            message: "No recent data".to_owned(),
        },
    };
    Ok(Json(response))
}

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(OpenApi)]
#[openapi(
    paths(create_reading, get_latest_reading, get_reading_history, get_statistics, health),
    components(schemas(
        NewReading,
        ReadingDto,
        IngestResponse,
        LatestResponse,
        HistoryResponse,
        StatsResponse,
        Stats,
        Source,
    )),
    tags(
        (name = "readings", description = "Reading ingest and lookup endpoints"),
        (name = "stats", description = "Aggregate statistics endpoints"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Air Quality Service API",
        version = "0.1.0",
        description = "REST API for environmental sensor ingest and cached queries"
    )
)]
pub struct ApiDoc;
