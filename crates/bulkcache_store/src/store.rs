// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`CacheStore`] defines the interface that all backends must implement.
//! Batched operations are first-class so remote backends can serve a whole
//! request in one round trip.

use std::{collections::HashMap, time::Duration};

use crate::Error;

/// A key in a cache namespace.
///
/// Keys are derived from call arguments by the caller and must be stable for a given
/// logical argument.
pub type CacheKey = String;

/// Trait for cache storage backends.
///
/// All operations are backend I/O and report failures through [`Error`]. Implementations
/// must be safe for concurrent use: the engine shares one store between all callers and relies
/// on the backend to make each individual call atomic.
///
/// Only `len` and `is_empty` have default implementations:
/// - `len`: Returns `None` (not all stores track size)
/// - `is_empty`: Delegates to `len`
#[cfg_attr(
    any(test, feature = "dynamic-store"),
    dynosaur::dynosaur(pub(crate) DynCacheStore = dyn(box) CacheStore, bridge(none))
)]
pub trait CacheStore<V>: Send + Sync {
    /// Reads a single value.
    fn read(&self, key: &CacheKey) -> impl Future<Output = Result<Option<V>, Error>> + Send;

    /// Reads several values at once.
    ///
    /// Only keys that are present are included in the returned map; absent keys are not errors.
    fn read_many(&self, keys: &[CacheKey]) -> impl Future<Output = Result<HashMap<CacheKey, V>, Error>> + Send;

    /// Writes a single value that expires after `ttl`.
    ///
    /// A `ttl` of [`Duration::MAX`] means the value never expires.
    fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> impl Future<Output = Result<(), Error>> + Send;

    /// Writes several values that all expire after `ttl`.
    fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns `true` if a live value exists for `key`.
    ///
    /// Must return `false` for expired values even if they have not been purged yet.
    fn contains_key(&self, key: &CacheKey) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes the given keys. Missing keys are ignored.
    fn remove(&self, keys: &[CacheKey]) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every entry.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the store contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}
