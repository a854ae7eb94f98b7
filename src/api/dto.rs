use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{db::models::Reading, query::Source, stats::Stats};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingDto {
    pub id: i64,
    pub sensor_id: String,
    pub co2_ppm: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            co2_ppm: r.co2_ppm,
            temperature: r.temperature,
            humidity: r.humidity,
            recorded_at: r.recorded_at,
        }
    }
}

/// Response for `POST /readings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub status: String,
    pub reading: ReadingDto,
}

/// Response for `GET /readings/latest/{sensor_id}`. `data` is `null` when
/// the cache holds no fresh entry for the sensor.
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestResponse {
    pub source: Source,
    pub data: Option<ReadingDto>,
}

/// Response for `GET /readings/history/{sensor_id}`, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub sensor_id: String,
    pub count: usize,
    pub readings: Vec<ReadingDto>,
}

/// Response for `GET /stats/{sensor_id}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StatsResponse {
    Ready { source: Source, stats: Stats },
    NoRecentData { message: String },
}
