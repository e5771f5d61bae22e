// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dynamic store wrapper for type erasure.

use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use crate::{CacheKey, CacheStore, Error, store::DynCacheStore};

/// Extension trait for converting any `CacheStore` into a `DynamicStore`.
///
/// This trait is automatically implemented for all types that implement `CacheStore`.
///
/// # Examples
///
/// ```
/// use bulkcache_store::{CacheStore, DynamicStore, DynamicStoreExt};
///
/// fn erase<S>(store: S) -> DynamicStore<i32>
/// where
///     S: CacheStore<i32> + 'static,
/// {
///     store.into_dynamic()
/// }
/// ```
pub trait DynamicStoreExt<V>: Sized {
    /// Converts this store into a `DynamicStore`.
    fn into_dynamic(self) -> DynamicStore<V>;
}

impl<V, S> DynamicStoreExt<V> for S
where
    S: CacheStore<V> + 'static,
{
    fn into_dynamic(self) -> DynamicStore<V> {
        DynamicStore::new(self)
    }
}

/// A clonable store with type erasure.
///
/// `DynamicStore` wraps a trait object in an `Arc` so that one backend can be shared by
/// several owners while keeping dynamic dispatch. Use it to keep stores of different
/// concrete types side by side, for example in a registry of named namespaces.
pub struct DynamicStore<V>(Arc<DynCacheStore<'static, V>>);

impl<V> DynamicStore<V> {
    pub(crate) fn new<S>(store: S) -> Self
    where
        S: CacheStore<V> + Send + Sync + 'static,
    {
        Self(DynCacheStore::new_arc(store))
    }
}

impl<V> Debug for DynamicStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicStore").finish()
    }
}

impl<V> Clone for DynamicStore<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> CacheStore<V> for DynamicStore<V>
where
    V: Send,
{
    async fn read(&self, key: &CacheKey) -> Result<Option<V>, Error> {
        self.0.read(key).await
    }

    async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, Error> {
        self.0.read_many(keys).await
    }

    async fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> Result<(), Error> {
        self.0.write(key, value, ttl).await
    }

    async fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> Result<(), Error> {
        self.0.write_many(entries, ttl).await
    }

    async fn contains_key(&self, key: &CacheKey) -> Result<bool, Error> {
        self.0.contains_key(key).await
    }

    async fn remove(&self, keys: &[CacheKey]) -> Result<(), Error> {
        self.0.remove(keys).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.0.clear().await
    }

    fn len(&self) -> Option<u64> {
        self.0.len()
    }

    fn is_empty(&self) -> Option<bool> {
        self.0.is_empty()
    }
}
