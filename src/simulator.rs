use std::time::Duration;

use chrono::{Local, Timelike};
use rand::Rng;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{db::models::NewReading, ingest::IngestService};

/// Normal atmospheric CO2 baseline in ppm.
const BASE_CO2_PPM: f64 = 400.0;

/// Synthetic CO2/temperature/humidity source, used when no hardware
/// sensors are posting readings.
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    sensor_id: String,
}

impl SensorSimulator {
    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Generate one plausible reading: CO2 follows a daily curve around the
    /// atmospheric baseline with uniform jitter, temperature and humidity
    /// wander around indoor norms.
    pub fn next_reading(&self) -> NewReading {
        let mut rng = rand::thread_rng();
        let hour = f64::from(Local::now().hour());
        let daily_variation = 100.0 * ((hour - 12.0) / 12.0).abs();

        NewReading {
            sensor_id: self.sensor_id.clone(),
            co2_ppm: BASE_CO2_PPM + daily_variation + rng.gen_range(-50.0..=50.0),
            temperature: 20.0 + rng.gen_range(-2.0..=5.0),
            humidity: 45.0 + rng.gen_range(-10.0..=10.0),
        }
    }
}

/// Periodic generator feeding the ingest path.
///
/// A failed iteration is logged and the loop keeps ticking; cancelling
/// `shutdown` stops it cleanly. Spawn via `tokio::spawn`.
pub async fn run(
    simulator: SensorSimulator,
    ingest: IngestService,
    interval: Duration,
    shutdown: CancellationToken,
) {
    info!(
        sensor_id = %simulator.sensor_id(),
        interval_secs = interval.as_secs(),
        "Simulator loop started"
    );
    let mut ticker = time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Simulator loop stopped");
                return;
            }
            _ = ticker.tick() => {
                match ingest.ingest(simulator.next_reading()).await {
                    Ok(reading) => debug!(
                        sensor_id = %reading.sensor_id,
                        co2_ppm = reading.co2_ppm,
                        "Generated synthetic reading"
                    ),
                    Err(e) => error!(error = %e, "Failed to ingest synthetic reading"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::cache::TtlCache;

    #[test]
    fn readings_stay_inside_the_generator_envelope() {
        let sim = SensorSimulator::new("SENSOR_001");
        for _ in 0..100 {
            let r = sim.next_reading();
            assert_eq!(r.sensor_id, "SENSOR_001");
            // baseline 400 + daily variation [0, 100] + jitter ±50
            assert!(r.co2_ppm >= 350.0 && r.co2_ppm <= 550.0, "co2 {}", r.co2_ppm);
            assert!(r.temperature >= 18.0 && r.temperature <= 25.0);
            assert!(r.humidity >= 35.0 && r.humidity <= 55.0);
            assert!(r.co2_ppm.is_finite() && r.temperature.is_finite() && r.humidity.is_finite());
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn loop_ingests_and_stops_on_cancellation(pool: SqlitePool) {
        let ingest = IngestService::new(pool.clone(), TtlCache::new());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run(
            SensorSimulator::new("SENSOR_001"),
            ingest,
            Duration::from_millis(5),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(count >= 1, "expected at least one generated reading");

        // No more rows arrive once the loop has been cancelled.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (after,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(after, count);
    }
}
