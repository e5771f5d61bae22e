// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records all
//! operations and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{CacheKey, CacheStore, Error};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp<V> {
    /// A single-key read.
    Read(CacheKey),
    /// A batched read of the given keys.
    ReadMany(Vec<CacheKey>),
    /// A single-key write.
    Write {
        /// The key that was written.
        key: CacheKey,
        /// The value that was written.
        value: V,
        /// The TTL the value was written with.
        ttl: Duration,
    },
    /// A batched write.
    WriteMany {
        /// The entries that were written.
        entries: HashMap<CacheKey, V>,
        /// The TTL all entries were written with.
        ttl: Duration,
    },
    /// An existence check.
    ContainsKey(CacheKey),
    /// A removal of the given keys.
    Remove(Vec<CacheKey>),
    /// A clear operation.
    Clear,
}

impl<V> StoreOp<V> {
    /// Returns `true` for operations that read from the store.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read(_) | Self::ReadMany(_) | Self::ContainsKey(_))
    }

    /// Returns `true` for operations that write to the store.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::WriteMany { .. })
    }
}

type FailPredicate<V> = Box<dyn Fn(&StoreOp<V>) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Values never expire; the TTL of every write is recorded so tests can assert on it.
/// Clones share the same data and operation log, so a test can register one clone with
/// the engine and inspect another.
///
/// # Examples
///
/// ```
/// use bulkcache_store::{testing::{MockStore, StoreOp}, CacheStore};
/// use std::time::Duration;
///
/// # futures::executor::block_on(async {
/// let store = MockStore::<i32>::new();
///
/// store.write(&"key".to_string(), 42, Duration::from_secs(5)).await.unwrap();
/// assert_eq!(store.read(&"key".to_string()).await.unwrap(), Some(42));
///
/// assert_eq!(store.operations(), vec![
///     StoreOp::Write { key: "key".to_string(), value: 42, ttl: Duration::from_secs(5) },
///     StoreOp::Read("key".to_string()),
/// ]);
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use bulkcache_store::{testing::{MockStore, StoreOp}, CacheStore};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::<i32>::new();
///
/// store.fail_when(|op| matches!(op, StoreOp::ReadMany(_)));
/// assert!(store.read_many(&["a".to_string()]).await.is_err());
/// assert!(store.read(&"a".to_string()).await.is_ok());
/// # });
/// ```
pub struct MockStore<V> {
    data: Arc<Mutex<HashMap<CacheKey, V>>>,
    operations: Arc<Mutex<Vec<StoreOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockStore<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockStore<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockStore<V> {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock store with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<CacheKey, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of entries in the store.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store holds a value for the given key.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should fail.
    /// Failed operations are still recorded but leave the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn should_fail(&self, op: &StoreOp<V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn record(&self, op: StoreOp<V>, what: &'static str) -> Result<(), Error> {
        let fail = self.should_fail(&op);
        self.operations.lock().push(op);
        if fail {
            return Err(Error::from_message(format!("mock: {what} failed")));
        }
        Ok(())
    }
}

impl<V> MockStore<V>
where
    V: Clone,
{
    /// Returns a copy of the value stored under `key`, bypassing the operation log.
    #[must_use]
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        self.data.lock().get(key).cloned()
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp<V>> {
        self.operations.lock().clone()
    }
}

impl<V> CacheStore<V> for MockStore<V>
where
    V: Clone + Send + Sync,
{
    async fn read(&self, key: &CacheKey) -> Result<Option<V>, Error> {
        self.record(StoreOp::Read(key.clone()), "read")?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, Error> {
        self.record(StoreOp::ReadMany(keys.to_vec()), "read_many")?;
        let data = self.data.lock();
        Ok(keys
            .iter()
            .filter_map(|key| data.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> Result<(), Error> {
        self.record(
            StoreOp::Write {
                key: key.clone(),
                value: value.clone(),
                ttl,
            },
            "write",
        )?;
        self.data.lock().insert(key.clone(), value);
        Ok(())
    }

    async fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> Result<(), Error> {
        self.record(
            StoreOp::WriteMany {
                entries: entries.clone(),
                ttl,
            },
            "write_many",
        )?;
        self.data.lock().extend(entries);
        Ok(())
    }

    async fn contains_key(&self, key: &CacheKey) -> Result<bool, Error> {
        self.record(StoreOp::ContainsKey(key.clone()), "contains_key")?;
        Ok(self.data.lock().contains_key(key))
    }

    async fn remove(&self, keys: &[CacheKey]) -> Result<(), Error> {
        self.record(StoreOp::Remove(keys.to_vec()), "remove")?;
        let mut data = self.data.lock();
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.record(StoreOp::Clear, "clear")?;
        self.data.lock().clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
