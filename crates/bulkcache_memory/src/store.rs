// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.
//!
//! This module provides an in-memory store backed by the moka crate,
//! which offers high-performance concurrent caching with eviction policies.

use std::{collections::HashMap, fmt::Debug, time::Duration, time::Instant};

use bulkcache_store::{CacheEntry, CacheKey, CacheStore, Error};
use moka::{Expiry, future::Cache};
use tick::Clock;

use crate::builder::InMemoryStoreBuilder;

/// Tells moka to purge each entry after its own TTL.
struct EntryExpiry;

impl<V> Expiry<CacheKey, CacheEntry<V>> for EntryExpiry {
    fn expire_after_create(&self, _key: &CacheKey, entry: &CacheEntry<V>, _created_at: Instant) -> Option<Duration> {
        entry.ttl()
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        entry: &CacheEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl()
    }
}

/// An in-memory store backed by moka.
///
/// This store provides:
/// - Concurrent access with high performance
/// - Automatic eviction based on capacity
/// - Per-entry expiry measured on a [`Clock`]
///
/// Moka purges entries in the background once their TTL has elapsed in wall-clock time. Reads
/// additionally compare the entry's expiry against the store's clock, so an expired entry is
/// never returned even while it is still physically present.
///
/// # Examples
///
/// ```
/// use bulkcache_memory::InMemoryStore;
/// use bulkcache_store::CacheStore;
/// use std::time::Duration;
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let control = ClockControl::new();
/// let store = InMemoryStore::<i32>::new(control.to_clock());
///
/// store.write(&"key".to_string(), 42, Duration::from_secs(10)).await.unwrap();
/// assert_eq!(store.read(&"key".to_string()).await.unwrap(), Some(42));
///
/// control.advance(Duration::from_secs(10));
/// assert_eq!(store.read(&"key".to_string()).await.unwrap(), None);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<CacheKey, CacheEntry<V>>,
    clock: Clock,
}

impl<V> Debug for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("name", &self.inner.name())
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl<V> InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new unbounded in-memory store.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::builder(clock).build()
    }

    /// Creates a new in-memory store with a maximum capacity.
    ///
    /// Once the capacity is reached, entries will be evicted using
    /// the `TinyLFU` policy.
    #[must_use]
    pub fn with_capacity(clock: Clock, max_capacity: u64) -> Self {
        Self::builder(clock).max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory store.
    #[must_use]
    pub fn builder(clock: Clock) -> InMemoryStoreBuilder<V> {
        InMemoryStoreBuilder::new(clock)
    }

    pub(crate) fn from_builder(builder: InMemoryStoreBuilder<V>) -> Self {
        let mut moka_builder = Cache::builder().expire_after(EntryExpiry);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            clock: builder.clock,
        }
    }

    /// Returns the live entry for `key`, purging it if it has expired.
    async fn live_entry(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        let entry = self.inner.get(key).await?;
        if entry.is_expired(self.clock.system_time()) {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry)
    }
}

impl<V> CacheStore<V> for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, key: &CacheKey) -> Result<Option<V>, Error> {
        Ok(self.live_entry(key).await.map(CacheEntry::into_value))
    }

    async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, Error> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.live_entry(key).await {
                found.insert(key.clone(), entry.into_value());
            }
        }
        Ok(found)
    }

    async fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> Result<(), Error> {
        let entry = CacheEntry::new(value, ttl, self.clock.system_time());
        self.inner.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> Result<(), Error> {
        let cached_at = self.clock.system_time();
        for (key, value) in entries {
            self.inner.insert(key, CacheEntry::new(value, ttl, cached_at)).await;
        }
        Ok(())
    }

    async fn contains_key(&self, key: &CacheKey) -> Result<bool, Error> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn remove(&self, keys: &[CacheKey]) -> Result<(), Error> {
        for key in keys {
            self.inner.invalidate(key).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.inner.entry_count())
    }
}
