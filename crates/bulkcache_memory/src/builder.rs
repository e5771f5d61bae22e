// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sizing and naming options for [`InMemoryStore`], kept free of moka types.

use std::marker::PhantomData;

use tick::Clock;

use crate::store::InMemoryStore;

/// Builder for configuring an `InMemoryStore`.
///
/// Expiry is always per entry: every write carries its own TTL, so the builder has no
/// store-wide time-to-live.
///
/// # Examples
///
/// ```
/// use bulkcache_memory::InMemoryStore;
/// use tick::Clock;
///
/// let store = InMemoryStore::<i32>::builder(Clock::new_frozen())
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .name("my-store")
///     .build();
/// ```
#[derive(Debug)]
pub struct InMemoryStoreBuilder<V> {
    pub(crate) clock: Clock,
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<V>,
}

impl<V> InMemoryStoreBuilder<V> {
    /// Starts an unbounded store that stamps writes and checks expiry with `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            max_capacity: None,
            initial_capacity: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Bounds the store to `capacity` entries.
    ///
    /// Past the bound moka evicts with `TinyLFU`, so a full store may drop sentinels and values
    /// before their TTL runs out.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Pre-allocates room for `capacity` entries.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Names the underlying moka cache, which shows up in its debug output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Creates the store.
    #[must_use]
    pub fn build(self) -> InMemoryStore<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        InMemoryStore::from_builder(self)
    }
}
