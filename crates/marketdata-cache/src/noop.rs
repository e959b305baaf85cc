//! Cache store that retains nothing.

use async_trait::async_trait;
use marketdata_core::{CacheKey, DataCache, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Cache store that never retains a payload.
///
/// Every read is a miss, so each accessor call reaches its source. Plug it
/// into a service to turn caching off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataCache for NoopCache {
    async fn get(&self, key: &CacheKey, _ttl: Duration) -> Result<Option<Value>> {
        trace!(key = %key, "NoopCache: miss");
        Ok(None)
    }

    async fn put(&self, key: &CacheKey, _value: Value) -> Result<()> {
        trace!(key = %key, "NoopCache: payload dropped");
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        trace!("NoopCache: nothing to invalidate");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopCache: nothing to clear");
        Ok(())
    }

    async fn len(&self) -> usize {
        0
    }
}
