use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    cache::{latest_key, stats_key, TtlCache, STATS_TTL},
    db::{self, models::Reading, StoreError},
    stats::{self, Stats},
};

/// Where a response was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Database,
}

/// Read side of the pipeline: cache-only latest lookups, cache-aside stats
/// lookups, and cache-bypassing history reads.
#[derive(Clone)]
pub struct QueryService {
    pool: SqlitePool,
    cache: TtlCache,
    stats_ttl: Duration,
    stats_window: chrono::Duration,
}

impl QueryService {
    pub fn new(pool: SqlitePool, cache: TtlCache) -> Self {
        Self {
            pool,
            cache,
            stats_ttl: STATS_TTL,
            stats_window: stats::default_window(),
        }
    }

    /// The most recent reading for `sensor_id`, served from the cache only.
    ///
    /// A miss reports the latest value as unknown rather than falling back
    /// to the durable store, so a cold cache yields `None` until the next
    /// ingest refreshes the entry even though history exists.
    pub async fn latest(&self, sensor_id: &str) -> Option<Reading> {
        self.cache.get_json(&latest_key(sensor_id)).await
    }

    /// Trailing-window aggregates for `sensor_id`, cache-aside.
    ///
    /// `Ok(None)` is the "no recent data" signal. It is never cached: the
    /// first reading after a quiet window must be visible to the very next
    /// stats query instead of hiding behind a cached empty result.
    pub async fn stats(&self, sensor_id: &str) -> Result<Option<(Source, Stats)>, StoreError> {
        let key = stats_key(sensor_id);
        if let Some(stats) = self.cache.get_json::<Stats>(&key).await {
            return Ok(Some((Source::Cache, stats)));
        }

        let Some(stats) = stats::compute(&self.pool, sensor_id, self.stats_window).await? else {
            return Ok(None);
        };

        if let Err(e) = self.cache.set_json(key, &stats, self.stats_ttl).await {
            warn!(sensor_id = %sensor_id, error = %e, "Failed to cache computed stats");
        }
        Ok(Some((Source::Database, stats)))
    }

    /// Readings from the trailing `hours`, newest first. Always reads the
    /// durable store; history is never cached.
    pub async fn history(&self, sensor_id: &str, hours: u32) -> Result<Vec<Reading>, StoreError> {
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(hours));
        db::readings_since(&self.pool, sensor_id, cutoff).await
    }

    #[cfg(test)]
    pub(crate) fn with_stats_ttl(mut self, ttl: Duration) -> Self {
        self.stats_ttl = ttl;
        self
    }
}
