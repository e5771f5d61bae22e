// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A store decorator that keeps serving when its backend fails.

use std::{collections::HashMap, time::Duration};

use bulkcache_store::{CacheKey, CacheStore};

/// Wraps a store so that backend failures degrade to cache misses.
///
/// Read errors become misses, and failed writes and removals are skipped. Every swallowed error
/// is logged with `tracing::warn!`. Use this for caches that only speed things up, where an
/// unreachable backend should cost latency rather than availability.
///
/// # Examples
///
/// ```
/// use bulkcache::{CacheConfig, FailOpenStore};
/// use bulkcache_memory::InMemoryStore;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let config = CacheConfig::<String>::builder(clock.clone())
///     .store("profiles", FailOpenStore::new(InMemoryStore::new(clock)))
///     .build();
/// # let _ = config;
/// ```
#[derive(Debug, Clone)]
pub struct FailOpenStore<S> {
    inner: S,
}

impl<S> FailOpenStore<S> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, V> CacheStore<V> for FailOpenStore<S>
where
    S: CacheStore<V>,
    V: Send,
{
    async fn read(&self, key: &CacheKey) -> Result<Option<V>, bulkcache_store::Error> {
        Ok(self.inner.read(key).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, cache.key = %key, "store read failed, treating as a miss");
            None
        }))
    }

    async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, bulkcache_store::Error> {
        Ok(self.inner.read_many(keys).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, keys = keys.len(), "store read failed, treating as a miss");
            HashMap::new()
        }))
    }

    async fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> Result<(), bulkcache_store::Error> {
        if let Err(e) = self.inner.write(key, value, ttl).await {
            tracing::warn!(error = %e, cache.key = %key, "store write failed, skipping");
        }
        Ok(())
    }

    async fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> Result<(), bulkcache_store::Error> {
        let count = entries.len();
        if let Err(e) = self.inner.write_many(entries, ttl).await {
            tracing::warn!(error = %e, keys = count, "store write failed, skipping");
        }
        Ok(())
    }

    async fn contains_key(&self, key: &CacheKey) -> Result<bool, bulkcache_store::Error> {
        Ok(self.inner.contains_key(key).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, cache.key = %key, "store lookup failed, treating as a miss");
            false
        }))
    }

    async fn remove(&self, keys: &[CacheKey]) -> Result<(), bulkcache_store::Error> {
        if let Err(e) = self.inner.remove(keys).await {
            tracing::warn!(error = %e, keys = keys.len(), "store remove failed, skipping");
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), bulkcache_store::Error> {
        if let Err(e) = self.inner.clear().await {
            tracing::warn!(error = %e, "store clear failed, skipping");
        }
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }
}
