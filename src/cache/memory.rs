/*!
 * Process-local cache backend.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::CacheBackend;
use crate::errors::CacheError;

/// Stored value with its optional deadline
#[derive(Debug, Clone)]
struct CacheSlot {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheSlot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// In-memory cache shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheSlot>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of live entries in the cache
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    /// Check if the cache holds no live entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Memory cache cleared");
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read();
            entries
                .get(key)
                .filter(|slot| !slot.is_expired(now))
                .map(|slot| slot.value.clone())
        };

        match found {
            Some(value) => {
                *self.hits.write() += 1;
                debug!("Cache hit for '{}'", key);
                Ok(Some(value))
            }
            None => {
                *self.misses.write() += 1;
                debug!("Cache miss for '{}'", key);
                // Expired slots are removed lazily on the read that finds them
                self.entries.write().retain(|_, slot| !slot.is_expired(now));
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let slot = CacheSlot {
            value: value.to_string(),
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };
        self.entries.write().insert(key.to_string(), slot);
        debug!("Cached '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        debug!("Removed '{}' from cache", key);
        Ok(())
    }
}
