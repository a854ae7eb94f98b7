use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One persisted sensor reading. Rows are append-only: never updated or
/// deleted once written.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Reading {
    pub id: i64,
    pub sensor_id: String,
    pub co2_ppm: f64,
    pub temperature: f64,
    pub humidity: f64,
    /// Assigned by the server at ingest, not taken from the client.
    pub recorded_at: DateTime<Utc>,
}

/// An inbound reading before validation and persistence — the POST body,
/// the simulator output, and the ingest input.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewReading {
    pub sensor_id: String,
    pub co2_ppm: f64,
    pub temperature: f64,
    pub humidity: f64,
}
