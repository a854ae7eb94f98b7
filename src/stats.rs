use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::db::{self, models::Reading, StoreError};

/// Aggregates are computed over the trailing hour of readings.
pub fn default_window() -> Duration {
    Duration::hours(1)
}

/// Window aggregates for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    pub avg_co2: f64,
    pub max_co2: f64,
    pub min_co2: f64,
    pub avg_temp: f64,
    pub sample_count: usize,
}

/// Fold readings into window aggregates. `None` for an empty slice: "no
/// recent data" is a distinct signal, not a zero-valued `Stats`. The
/// result does not depend on the order of `readings`.
pub fn aggregate(readings: &[Reading]) -> Option<Stats> {
    if readings.is_empty() {
        return None;
    }

    let mut sum_co2 = 0.0;
    let mut sum_temp = 0.0;
    let mut max_co2 = f64::NEG_INFINITY;
    let mut min_co2 = f64::INFINITY;
    for r in readings {
        sum_co2 += r.co2_ppm;
        sum_temp += r.temperature;
        max_co2 = max_co2.max(r.co2_ppm);
        min_co2 = min_co2.min(r.co2_ppm);
    }

    let n = readings.len() as f64;
    Some(Stats {
        avg_co2: sum_co2 / n,
        max_co2,
        min_co2,
        avg_temp: sum_temp / n,
        sample_count: readings.len(),
    })
}

/// Compute aggregates for `sensor_id` over the trailing `window` from the
/// durable store. `Ok(None)` means no readings fell inside the window.
pub async fn compute(
    pool: &SqlitePool,
    sensor_id: &str,
    window: Duration,
) -> Result<Option<Stats>, StoreError> {
    let readings = db::readings_since(pool, sensor_id, Utc::now() - window).await?;
    Ok(aggregate(&readings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(co2_ppm: f64, temperature: f64) -> Reading {
        Reading {
            id: 0,
            sensor_id: "dev1".to_owned(),
            co2_ppm,
            temperature,
            humidity: 45.0,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn empty_slice_yields_none_not_zeroes() {
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn single_reading_is_its_own_aggregate() {
        let stats = aggregate(&[reading(412.0, 21.5)]).unwrap();
        assert_eq!(stats.avg_co2, 412.0);
        assert_eq!(stats.max_co2, 412.0);
        assert_eq!(stats.min_co2, 412.0);
        assert_eq!(stats.avg_temp, 21.5);
        assert_eq!(stats.sample_count, 1);
    }

    #[test]
    fn multiple_readings_fold_correctly() {
        let stats = aggregate(&[
            reading(400.0, 20.0),
            reading(420.0, 22.0),
            reading(440.0, 24.0),
        ])
        .unwrap();

        assert_eq!(stats.avg_co2, 420.0);
        assert_eq!(stats.max_co2, 440.0);
        assert_eq!(stats.min_co2, 400.0);
        assert_eq!(stats.avg_temp, 22.0);
        assert_eq!(stats.sample_count, 3);
    }

    #[test]
    fn result_is_order_independent() {
        let forward = aggregate(&[reading(400.0, 20.0), reading(500.0, 25.0)]);
        let backward = aggregate(&[reading(500.0, 25.0), reading(400.0, 20.0)]);
        assert_eq!(forward, backward);
    }
}
