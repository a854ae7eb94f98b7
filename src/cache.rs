use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{sync::RwLock, time::Instant};
use tracing::warn;

/// TTL for `latest:{sensor_id}` entries, refreshed on every ingest.
pub const LATEST_TTL: Duration = Duration::from_secs(300);

/// TTL for `stats:{sensor_id}` entries. Ingest never touches these, so a
/// cached aggregate may lag the store by up to this long.
pub const STATS_TTL: Duration = Duration::from_secs(60);

/// Cache key for the most recent reading of a sensor.
pub fn latest_key(sensor_id: &str) -> String {
    format!("latest:{sensor_id}")
}

/// Cache key for the windowed aggregates of a sensor.
pub fn stats_key(sensor_id: &str) -> String {
    format!("stats:{sensor_id}")
}

struct Entry {
    value: serde_json::Value,
    created: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= self.ttl
    }
}

/// In-memory key-value cache with a per-entry time-to-live.
///
/// Expiry is lazy: nothing sweeps the map in the background, but every
/// `get` re-checks freshness against the clock, so an entry past its TTL
/// is absent regardless of eviction scheduling. Wrapped in `Arc` so it can
/// be cheaply cloned and shared across tasks; `tokio::sync::RwLock` keeps
/// concurrent readers from blocking each other.
#[derive(Clone, Default)]
pub struct TtlCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value under `key`, or `None` if it was never set or its
    /// TTL has elapsed. An expired entry found here is removed so the map
    /// does not accumulate dead entries between overwrites.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        {
            let map = self.inner.read().await;
            match map.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Re-check under the write lock: a concurrent `set` may have
        // replaced the expired entry since the read lock was dropped.
        let mut map = self.inner.write().await;
        if map.get(key).is_some_and(|entry| entry.is_expired(now)) {
            map.remove(key);
        }
        None
    }

    /// Store `value` under `key`, unconditionally overwriting any existing
    /// entry and resetting its creation instant.
    pub async fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        let entry = Entry {
            value,
            created: Instant::now(),
            ttl,
        };
        self.inner.write().await.insert(key.into(), entry);
    }

    /// Drop the entry under `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        self.inner.write().await.remove(key);
    }

    /// Drop every entry. Readers fall back to the durable store afterwards;
    /// no data is lost, only read latency.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Typed `get`: a cached value that no longer deserializes as `T`
    /// degrades to a miss rather than failing the caller.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping cache entry that failed to deserialize");
                self.invalidate(key).await;
                None
            }
        }
    }

    /// Typed `set` through `serde_json`.
    pub async fn set_json<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl).await;
        Ok(())
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time::{self, Duration};

    use super::*;

    #[tokio::test]
    async fn get_returns_none_for_unset_key() {
        let cache = TtlCache::new();
        assert!(cache.get("latest:dev1").await.is_none());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = TtlCache::new();
        cache.set("k", json!({"co2_ppm": 412.5}), LATEST_TTL).await;
        assert_eq!(cache.get("k").await, Some(json!({"co2_ppm": 412.5})));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_present_just_before_ttl_absent_just_after() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_secs(300)).await;

        time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("k").await.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_absent_at_exact_ttl() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_secs(60)).await;

        time::advance(Duration::from_secs(60)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_resets_creation_instant() {
        let cache = TtlCache::new();
        cache.set("k", json!("old"), Duration::from_secs(300)).await;

        time::advance(Duration::from_secs(200)).await;
        cache.set("k", json!("new"), Duration::from_secs(300)).await;

        // 200s after the overwrite the original entry would have expired;
        // the rewritten one has 100s left.
        time::advance(Duration::from_secs(200)).await;
        assert_eq!(cache.get("k").await, Some(json!("new")));

        time::advance(Duration::from_secs(101)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ttls_are_independent_per_key() {
        let cache = TtlCache::new();
        cache.set("latest:dev1", json!(1), Duration::from_secs(300)).await;
        cache.set("stats:dev1", json!(2), Duration::from_secs(60)).await;

        time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("latest:dev1").await.is_some());
        assert!(cache.get("stats:dev1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_physically_removed_on_read() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_secs(1)).await;
        assert_eq!(cache.len().await, 1);

        time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), LATEST_TTL).await;
        cache.invalidate("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn clear_flushes_everything() {
        let cache = TtlCache::new();
        cache.set("latest:dev1", json!(1), LATEST_TTL).await;
        cache.set("stats:dev1", json!(2), STATS_TTL).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn latest_and_stats_keys_never_collide() {
        let cache = TtlCache::new();
        cache.set(latest_key("dev1"), json!("latest"), LATEST_TTL).await;
        cache.set(stats_key("dev1"), json!("stats"), STATS_TTL).await;

        assert_eq!(cache.get(&latest_key("dev1")).await, Some(json!("latest")));
        assert_eq!(cache.get(&stats_key("dev1")).await, Some(json!("stats")));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let cache = TtlCache::new();
        let clone = cache.clone();

        cache.set("k", json!(42), LATEST_TTL).await;
        assert_eq!(clone.get("k").await, Some(json!(42)));
    }

    #[tokio::test]
    async fn get_json_drops_undeserializable_entry() {
        #[derive(serde::Deserialize)]
        struct Typed {
            #[allow(dead_code)]
            n: i64,
        }

        let cache = TtlCache::new();
        cache.set("k", json!("not an object"), LATEST_TTL).await;

        assert!(cache.get_json::<Typed>("k").await.is_none());
        // The poisoned entry is gone entirely, not just unreadable as Typed.
        assert!(cache.get("k").await.is_none());
    }
}
