pub mod models;

use std::{future::Future, str::FromStr, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;

use models::{NewReading, Reading};

/// Upper bound on any single store operation. A store that exceeds it is
/// reported as unavailable rather than returning a partial result.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// The durable store failed a read or write. Retryable from the caller's
/// point of view; an ingest hitting this is not acknowledged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("durable store query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("durable store query timed out after {0:?}")]
    Timeout(Duration),
}

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(STORE_TIMEOUT);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn bounded<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(STORE_TIMEOUT, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(STORE_TIMEOUT)),
    }
}

/// Append one reading and return the stored row with its assigned id.
pub async fn insert_reading(
    pool: &SqlitePool,
    input: &NewReading,
    recorded_at: DateTime<Utc>,
) -> Result<Reading, StoreError> {
    bounded(
        sqlx::query_as::<_, Reading>(
            "INSERT INTO sensor_readings (sensor_id, co2_ppm, temperature, humidity, recorded_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, sensor_id, co2_ppm, temperature, humidity, recorded_at",
        )
        .bind(&input.sensor_id)
        .bind(input.co2_ppm)
        .bind(input.temperature)
        .bind(input.humidity)
        .bind(recorded_at)
        .fetch_one(pool),
    )
    .await
}

/// All readings for `sensor_id` with `recorded_at >= cutoff`, newest first.
pub async fn readings_since(
    pool: &SqlitePool,
    sensor_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Reading>, StoreError> {
    bounded(
        sqlx::query_as::<_, Reading>(
            "SELECT id, sensor_id, co2_ppm, temperature, humidity, recorded_at \
             FROM sensor_readings \
             WHERE sensor_id = ?1 AND recorded_at >= ?2 \
             ORDER BY recorded_at DESC",
        )
        .bind(sensor_id)
        .bind(cutoff)
        .fetch_all(pool),
    )
    .await
}
