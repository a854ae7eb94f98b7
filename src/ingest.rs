use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    cache::{latest_key, TtlCache, LATEST_TTL},
    db::{
        self,
        models::{NewReading, Reading},
        StoreError,
    },
};

#[derive(Debug, Error)]
pub enum IngestError {
    /// Rejected before any write; the caller can correct and retry.
    #[error("invalid reading: {0}")]
    InvalidInput(String),
    /// The durable append failed; the reading is not acknowledged and no
    /// cache entry was written.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Accepts readings, appends them to the durable store, and writes through
/// the per-sensor latest-reading cache entry.
#[derive(Clone)]
pub struct IngestService {
    pool: SqlitePool,
    cache: TtlCache,
    latest_ttl: Duration,
}

impl IngestService {
    pub fn new(pool: SqlitePool, cache: TtlCache) -> Self {
        Self {
            pool,
            cache,
            latest_ttl: LATEST_TTL,
        }
    }

    /// Validate, persist, then refresh `latest:{sensor_id}`.
    ///
    /// The durable append must succeed before anything touches the cache;
    /// the cache write is best-effort because the store is the source of
    /// truth. The stats entry is deliberately left alone — it expires on
    /// its own TTL.
    pub async fn ingest(&self, input: NewReading) -> Result<Reading, IngestError> {
        validate(&input)?;

        let reading = db::insert_reading(&self.pool, &input, Utc::now()).await?;

        if let Err(e) = self
            .cache
            .set_json(latest_key(&reading.sensor_id), &reading, self.latest_ttl)
            .await
        {
            warn!(
                sensor_id = %reading.sensor_id,
                error = %e,
                "Reading persisted but the latest-reading cache update failed"
            );
        }

        debug!(
            sensor_id = %reading.sensor_id,
            co2_ppm = reading.co2_ppm,
            "Reading ingested"
        );
        Ok(reading)
    }
}

fn validate(input: &NewReading) -> Result<(), IngestError> {
    if input.sensor_id.trim().is_empty() {
        return Err(IngestError::InvalidInput(
            "sensor_id must not be empty".to_owned(),
        ));
    }
    for (field, value) in [
        ("co2_ppm", input.co2_ppm),
        ("temperature", input.temperature),
        ("humidity", input.humidity),
    ] {
        if !value.is_finite() {
            return Err(IngestError::InvalidInput(format!(
                "{field} must be a finite number"
            )));
        }
    }
    Ok(())
}
