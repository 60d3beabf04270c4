// src/services/cache.rs
// DOCUMENTATION: In-memory TTL cache for cuisine lookups
// PURPOSE: Avoid repeating the cuisine lookup for the same spot within the TTL

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Decimal places used to bucket coordinates (about 11 m)
pub const CACHE_KEY_PRECISION: i32 = 4;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Cache key: coordinate rounded to CACHE_KEY_PRECISION decimals
pub type CuisineKey = (i64, i64);

/// Thread-safe cuisine cache with TTL
/// DOCUMENTATION: Only successful lookups are stored; the fallback tag never is.
pub struct CuisineCache {
    store: Arc<RwLock<HashMap<CuisineKey, CacheEntry<Vec<String>>>>>,
    default_ttl: Duration,
}

impl CuisineCache {
    /// Create new cache with default TTL
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn key_for(position: Coordinate) -> CuisineKey {
        position.grid_key(CACHE_KEY_PRECISION)
    }

    /// Get cached tags for a position
    pub async fn get(&self, position: Coordinate) -> Option<Vec<String>> {
        let key = Self::key_for(position);
        let store = self.store.read().await;

        match store.get(&key) {
            Some(entry) if !entry.is_expired() => {
                log::debug!("Cuisine cache HIT for {:?}", key);
                Some(entry.data.clone())
            }
            Some(_) => {
                log::debug!("Cuisine cache EXPIRED for {:?}", key);
                None
            }
            None => {
                log::debug!("Cuisine cache MISS for {:?}", key);
                None
            }
        }
    }

    /// Set cached tags with default TTL
    pub async fn set(&self, position: Coordinate, tags: Vec<String>) {
        self.set_with_ttl(position, tags, self.default_ttl).await;
    }

    /// Set cached tags with custom TTL
    pub async fn set_with_ttl(&self, position: Coordinate, tags: Vec<String>, ttl: Duration) {
        let key = Self::key_for(position);
        let mut store = self.store.write().await;
        store.insert(key, CacheEntry::new(tags, ttl));
        log::debug!("Cuisine cache SET for {:?} (TTL: {}s)", key, ttl.as_secs());
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cuisine cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<CuisineCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}
