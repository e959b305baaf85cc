//! Cache trait for storing normalized payloads.
//!
//! This module defines the [`DataCache`] trait that every cache store
//! implements. Payloads are stored as JSON values so a single store can hold
//! every record kind; freshness is decided at read time against the TTL the
//! caller passes in.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::{error::Result, key::CacheKey};

/// Trait for caching normalized market data.
///
/// Expiry is lazy: an entry older than the TTL passed to [`get`](Self::get)
/// is reported as absent but stays stored until it is overwritten, swept by
/// [`invalidate_stale`](Self::invalidate_stale), or evicted by the store.
#[async_trait]
pub trait DataCache: Send + Sync {
    /// Retrieves the payload stored under `key` if it is at most `ttl` old.
    ///
    /// Returns `Ok(Some(value))` for a fresh entry, `Ok(None)` if the entry is
    /// missing or stale.
    async fn get(&self, key: &CacheKey, ttl: Duration) -> Result<Option<Value>>;

    /// Stores a payload under `key`, replacing any previous entry.
    async fn put(&self, key: &CacheKey, value: Value) -> Result<()>;

    /// Removes entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;

    /// Returns the number of physically stored entries, stale ones included.
    async fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
