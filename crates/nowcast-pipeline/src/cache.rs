//! Read-through key-value cache in front of the fetch layer.
//!
//! The cache is an explicit, injected collaborator rather than ambient
//! state, keyed by `(coordinates, unit-system)`. TTL is evaluated on
//! read against the entry's insertion time, so one store can serve
//! callers with different freshness requirements.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::fetch::{GeoPoint, UnitSystem};

/// Cache key for a forecast request, coordinates rounded to four
/// decimals so nearby repeat queries share an entry.
pub fn forecast_cache_key(point: GeoPoint, units: UnitSystem) -> String {
    format!(
        "forecast:{:.4}:{:.4}:{}",
        point.latitude,
        point.longitude,
        units.as_str()
    )
}

/// Cache key for an air-quality request.
pub fn air_quality_cache_key(point: GeoPoint) -> String {
    format!("airq:{:.4}:{:.4}", point.latitude, point.longitude)
}

/// Key-value store with TTL-on-read semantics.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Look up `key`; entries older than `ttl` miss.
    async fn get(&self, key: &str, ttl: Duration) -> Option<Value>;

    /// Store `value` under `key`, stamped with the current time.
    async fn set(&self, key: &str, value: Value);
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// In-process implementation of [`KeyValueCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Value)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().expect("cache mutex poisoned").len(),
        }
    }

    /// Drop every entry older than `ttl`.
    pub fn purge_expired(&self, ttl: Duration) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.retain(|_, (stored, _)| stored.elapsed() <= ttl);
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() <= ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            Some(_) => {
                // Expired for this caller; drop it so the map does not
                // accumulate stale payloads.
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fresh_entries_hit() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"v": 1})).await;
        assert_eq!(
            cache.get("k", Duration::from_secs(60)).await,
            Some(json!({"v": 1}))
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_misses() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1)).await;
        // An entry stored any time in the past is older than a zero TTL.
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("k", Duration::ZERO).await, None);
        assert_eq!(cache.stats().misses, 1);
        // The expired entry was dropped on read.
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn overwrite_refreshes_the_stamp() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1)).await;
        cache.set("k", json!(2)).await;
        assert_eq!(cache.get("k", Duration::from_secs(60)).await, Some(json!(2)));
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn keys_round_coordinates() {
        let key = forecast_cache_key(
            GeoPoint {
                latitude: 45.46421,
                longitude: 9.18988,
            },
            UnitSystem::Metric,
        );
        assert_eq!(key, "forecast:45.4642:9.1899:metric");
    }
}
