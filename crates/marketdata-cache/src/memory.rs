//! In-memory cache implementation.

use async_trait::async_trait;
use marketdata_core::{CacheKey, DataCache, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based expiry.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Process-local cache shared by every accessor of a service.
///
/// Entries live in a `RwLock`-protected `HashMap` and are lost when the cache
/// is dropped. Expiry is evaluated on read only; stale entries stay stored
/// until overwritten, swept with [`DataCache::invalidate_stale`], or evicted
/// by the optional capacity bound.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry<Value>>>,
    max_entries: Option<usize>,
}

impl InMemoryCache {
    /// Create a new empty, unbounded in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding at most `max_entries` keys.
    ///
    /// Storing a new key into a full cache evicts the entry stored longest ago.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::default(),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Returns the capacity bound, if any.
    #[must_use]
    pub const fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }
}

#[async_trait]
impl DataCache for InMemoryCache {
    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey, ttl: Duration) -> Result<Option<Value>> {
        let cache = self.entries.read().await;
        match cache.get(key) {
            Some(entry) if !entry.is_stale(ttl) => {
                debug!("Cache hit");
                Ok(Some(entry.data.clone()))
            }
            Some(_) => {
                debug!("Cache entry stale");
                Ok(None)
            }
            None => {
                debug!("Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), fields(key = %key))]
    async fn put(&self, key: &CacheKey, value: Value) -> Result<()> {
        let mut cache = self.entries.write().await;

        if let Some(max) = self.max_entries {
            if cache.len() >= max && !cache.contains_key(key) {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    cache.remove(&oldest);
                    debug!(evicted = %oldest, "Evicted oldest entry");
                }
            }
        }

        cache.insert(key.clone(), CacheEntry::new(value));
        debug!("Cached payload");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
