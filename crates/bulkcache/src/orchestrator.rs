// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-first entry point for single-key and multi-key operations.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
    sync::Arc,
};

use parking_lot::RwLock;

use crate::{
    CacheKey, CacheName, Container, Error, KeyValueMerger, Layout, MultiKey, ResultAssembler, SingleKey, Stored,
    config::CacheConfig,
    telemetry::{CacheActivity, CacheOperation, Stopwatch},
};

/// Turns data-fetch operations into cache-first operations.
///
/// The orchestrator holds the current [`CacheConfig`] and nothing else: every call reads the
/// configuration once and runs against it to completion, so replacing the configuration never
/// affects calls already in flight. Calls are independent of each other. Two overlapping calls
/// that miss the same key both run the data source.
///
/// Data sources are closures returning a future. Their error type `E` must be constructible from
/// [`Error`] so cache failures and source failures come back through the same `Result`.
///
/// # Examples
///
/// ```
/// use bulkcache::{CacheConfig, CacheOrchestrator, Error, SingleKey, Ttl};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let orchestrator = CacheOrchestrator::new(CacheConfig::builder(Clock::new_frozen()).memory("users").build());
/// let op = SingleKey::new("users", |id: &u64| format!("user:{id}")).ttl(Ttl::from_millis(60_000));
///
/// let name = orchestrator
///     .read_or_compute(&op, &7, || async { Ok::<_, Error>(Some("Ada".to_string())) })
///     .await?;
/// assert_eq!(name.as_deref(), Some("Ada"));
///
/// // Served from the cache; the source is not called again.
/// let name = orchestrator
///     .read_or_compute(&op, &7, || async { Ok::<_, Error>(Some("Grace".to_string())) })
///     .await?;
/// assert_eq!(name.as_deref(), Some("Ada"));
/// # Ok::<(), Error>(())
/// # }).unwrap();
/// ```
pub struct CacheOrchestrator<V> {
    config: RwLock<Arc<CacheConfig<V>>>,
}

impl<V> CacheOrchestrator<V> {
    /// Creates an orchestrator running against `config`.
    #[must_use]
    pub fn new(config: CacheConfig<V>) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> Arc<CacheConfig<V>> {
        Arc::clone(&self.config.read())
    }

    /// Swaps in a new configuration and returns the previous one.
    ///
    /// Calls that already started keep running against the configuration they read.
    pub fn replace_config(&self, config: CacheConfig<V>) -> Arc<CacheConfig<V>> {
        std::mem::replace(&mut *self.config.write(), Arc::new(config))
    }
}

impl<V> std::fmt::Debug for CacheOrchestrator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator").field("config", &*self.config.read()).finish()
    }
}

impl<V> CacheOrchestrator<V>
where
    V: Clone + Send + Sync,
{
    /// Looks `args` up in the cache and falls back to `source` on a miss, without writing back.
    ///
    /// A cached sentinel returns `None` without calling `source`. When caching is inactive for
    /// the call, `source` runs and its result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns gate, configuration and backend errors converted into `E`, or the error of `source`.
    pub async fn read_only<A, F, Fut, E>(&self, op: &SingleKey<A>, args: &A, source: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
        E: From<Error>,
    {
        let config = self.config();
        if !config.is_caching_active(op.time_to_live(), op.gate_ref(), args)? {
            return bypass(&config, op.cache(), source()).await;
        }

        let store = config.traced(op.cache())?;
        let key = op.key(args);

        if let Some(stored) = store.read(&key).await? {
            config.record_hit(op.cache(), true);
            return Ok(stored.into_value());
        }

        config.record_hit(op.cache(), false);
        compute(&config, op.cache(), source()).await
    }

    /// Looks `args` up in the cache, computing and caching the value on a miss.
    ///
    /// A cached sentinel returns `None` without calling `source`. On a miss the computed value is
    /// written with the operation's TTL. When the source returns `None` and penetration protection
    /// is on, a sentinel is written instead, with the sentinel TTL capped to the operation's TTL.
    /// When caching is inactive for the call, `source` runs and nothing touches the store.
    ///
    /// # Errors
    ///
    /// Returns gate, configuration and backend errors converted into `E`, or the error of `source`.
    pub async fn read_or_compute<A, F, Fut, E>(&self, op: &SingleKey<A>, args: &A, source: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
        E: From<Error>,
    {
        let config = self.config();
        let ttl = op.time_to_live();
        if !config.is_caching_active(ttl, op.gate_ref(), args)? {
            return bypass(&config, op.cache(), source()).await;
        }

        let store = config.traced(op.cache())?;
        let key = op.key(args);

        // The entry may expire or be removed between the two calls; that counts as a miss.
        if store.contains_key(&key).await?
            && let Some(stored) = store.read(&key).await?
        {
            config.record_hit(op.cache(), true);
            return Ok(stored.into_value());
        }

        config.record_hit(op.cache(), false);
        let value = compute(&config, op.cache(), source()).await?;

        match &value {
            Some(value) => store.write(&key, Stored::Value(value.clone()), ttl.as_duration()).await?,
            None if config.prevents_penetration() => {
                store.write(&key, Stored::Sentinel, config.sentinel_ttl_for(ttl)).await?;
            }
            None => {}
        }

        Ok(value)
    }

    /// Looks up every identity in `ids` and calls `source` with the ones that missed, without
    /// writing back.
    ///
    /// See [`read_or_compute_many`](Self::read_or_compute_many) for how results are assembled,
    /// including the full-length requirement for array-shaped containers.
    ///
    /// # Errors
    ///
    /// Returns gate, configuration, assembly and backend errors converted into `E`, or the error
    /// of `source`.
    pub async fn read_only_many<A, I, C, F, Fut, E>(&self, op: &MultiKey<A, I, V>, args: &A, ids: &[I], source: F) -> Result<C, E>
    where
        I: Clone + Eq + Hash,
        C: Container<I, V>,
        F: FnOnce(Vec<I>) -> Fut,
        Fut: Future<Output = Result<C, E>>,
        E: From<Error>,
    {
        self.many(op, args, ids, source, false).await
    }

    /// Looks up every identity in `ids`, computes the ones that missed and caches them.
    ///
    /// `source` is called at most once, with the identities whose keys missed, in request order
    /// and with one identity per distinct key. Its values are matched back to keys by identity:
    /// through the operation's identity rule for list-shaped containers, or the map keys for
    /// map-shaped ones. Values for identities nobody asked for are discarded. Matched values are
    /// written with the operation's TTL; with penetration protection on, keys the source had no
    /// value for get a sentinel with the capped sentinel TTL.
    ///
    /// The returned `C` holds cached and computed values in request order and never exposes a
    /// sentinel. When caching is inactive for the call, `source` receives all of `ids` and its
    /// container is returned unchanged.
    ///
    /// Because `source` returns the same `C`, an array-shaped `C` such as `[Option<V>; N]` must
    /// come back at its full length `N` even though `source` only receives the missed
    /// identities. Fill the leading slots and leave the rest `None`; slot positions are ignored
    /// since values are matched by identity.
    ///
    /// # Errors
    ///
    /// Returns gate, configuration, assembly and backend errors converted into `E`, or the error
    /// of `source`. A list-, set- or array-shaped `C` requires an identity rule on `op`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache::{CacheConfig, CacheOrchestrator, Error, IdentityRule, MultiKey};
    /// use tick::Clock;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct User {
    ///     id: u64,
    ///     name: &'static str,
    /// }
    ///
    /// # futures::executor::block_on(async {
    /// let orchestrator = CacheOrchestrator::new(CacheConfig::builder(Clock::new_frozen()).memory("users").build());
    /// let op = MultiKey::new("users", |_: &(), id: &u64| format!("user:{id}"))
    ///     .identity(IdentityRule::new(|user: &User| user.id));
    ///
    /// let users: Vec<User> = orchestrator
    ///     .read_or_compute_many(&op, &(), &[1, 2], |ids| async move {
    ///         Ok::<_, Error>(ids.into_iter().map(|id| User { id, name: "fetched" }).collect())
    ///     })
    ///     .await?;
    /// assert_eq!(users.len(), 2);
    ///
    /// // Only identity 3 reaches the source.
    /// let users: Vec<User> = orchestrator
    ///     .read_or_compute_many(&op, &(), &[3, 1, 2], |ids| async move {
    ///         assert_eq!(ids, [3]);
    ///         Ok::<_, Error>(vec![User { id: 3, name: "new" }])
    ///     })
    ///     .await?;
    /// assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), [3, 1, 2]);
    /// # Ok::<(), Error>(())
    /// # }).unwrap();
    /// ```
    pub async fn read_or_compute_many<A, I, C, F, Fut, E>(
        &self,
        op: &MultiKey<A, I, V>,
        args: &A,
        ids: &[I],
        source: F,
    ) -> Result<C, E>
    where
        I: Clone + Eq + Hash,
        C: Container<I, V>,
        F: FnOnce(Vec<I>) -> Fut,
        Fut: Future<Output = Result<C, E>>,
        E: From<Error>,
    {
        self.many(op, args, ids, source, true).await
    }

    async fn many<A, I, C, F, Fut, E>(&self, op: &MultiKey<A, I, V>, args: &A, ids: &[I], source: F, write_back: bool) -> Result<C, E>
    where
        I: Clone + Eq + Hash,
        C: Container<I, V>,
        F: FnOnce(Vec<I>) -> Fut,
        Fut: Future<Output = Result<C, E>>,
        E: From<Error>,
    {
        let config = self.config();
        let ttl = op.time_to_live();
        if !config.is_caching_active(ttl, op.gate_ref(), args)? {
            return bypass(&config, op.cache(), source(ids.to_vec())).await;
        }

        if C::LAYOUT != Layout::Map && op.identity_ref().is_none() {
            return Err(Error::configuration(format!(
                "operation on '{}' returns a {:?} container but has no identity rule",
                op.cache(),
                C::LAYOUT
            ))
            .into());
        }

        let store = config.traced(op.cache())?;

        let slots: Vec<(I, CacheKey)> = ids.iter().map(|id| (id.clone(), op.key(args, id))).collect();
        let identity_map: HashMap<I, CacheKey> = slots.iter().cloned().collect();
        let keys = distinct_keys(&slots);

        if keys.is_empty() {
            return Ok(ResultAssembler::assemble::<C, I, V>(&slots, &HashMap::new())?);
        }

        let mut resolved = store.read_many(&keys).await?;
        for key in &keys {
            config.record_hit(op.cache(), resolved.contains_key(key));
        }

        let mut misses: HashSet<CacheKey> = keys.iter().filter(|key| !resolved.contains_key(*key)).cloned().collect();

        if !misses.is_empty() {
            let mut asked = HashSet::with_capacity(misses.len());
            let missing_ids = slots
                .iter()
                .filter(|(_, key)| misses.contains(key) && asked.insert(key))
                .map(|(id, _)| id.clone())
                .collect();

            let computed = compute(&config, op.cache(), source(missing_ids)).await?.into_computed();
            let merged = KeyValueMerger::merge(
                computed,
                op.identity_ref(),
                &mut misses,
                &identity_map,
                config.prevents_penetration(),
            )?;

            let (values, sentinels): (HashMap<_, _>, HashMap<_, _>) = merged.into_iter().partition(|(_, stored)| !stored.is_sentinel());

            if write_back {
                store.write_many(values.clone(), ttl.as_duration()).await?;
                store.write_many(sentinels, config.sentinel_ttl_for(ttl)).await?;
            }

            resolved.extend(values);
        }

        let values: HashMap<CacheKey, V> = resolved
            .into_iter()
            .filter_map(|(key, stored)| stored.into_value().map(|value| (key, value)))
            .collect();

        Ok(ResultAssembler::assemble::<C, I, V>(&slots, &values)?)
    }

    /// Removes the entry `op` caches for `args`.
    ///
    /// Invalidation ignores the gate and the global switch and never calls a data source.
    ///
    /// # Errors
    ///
    /// Returns configuration and backend errors.
    pub async fn invalidate<A>(&self, op: &SingleKey<A>, args: &A) -> Result<(), Error> {
        self.remove(op.cache(), &[op.key(args)]).await
    }

    /// Removes the entries `op` caches for every identity in `ids`.
    ///
    /// # Errors
    ///
    /// Returns configuration and backend errors.
    pub async fn invalidate_many<A, I>(&self, op: &MultiKey<A, I, V>, args: &A, ids: &[I]) -> Result<(), Error> {
        let slots: Vec<((), CacheKey)> = ids.iter().map(|id| ((), op.key(args, id))).collect();
        self.remove(op.cache(), &distinct_keys(&slots)).await
    }

    /// Removes `keys` from the store named `cache`. An empty key list does nothing.
    ///
    /// # Errors
    ///
    /// Returns configuration and backend errors.
    pub async fn remove(&self, cache: CacheName, keys: &[CacheKey]) -> Result<(), Error> {
        let config = self.config();
        let store = config.traced(cache)?;
        if keys.is_empty() {
            return Ok(());
        }
        store.remove(keys).await
    }

    /// Removes every entry from the store named `cache`.
    ///
    /// # Errors
    ///
    /// Returns configuration and backend errors.
    pub async fn clear(&self, cache: CacheName) -> Result<(), Error> {
        let config = self.config();
        config.traced(cache)?.clear().await
    }
}

/// Keys in first-occurrence order, without duplicates.
fn distinct_keys<I>(slots: &[(I, CacheKey)]) -> Vec<CacheKey> {
    let mut seen = HashSet::with_capacity(slots.len());
    slots
        .iter()
        .filter(|(_, key)| seen.insert(key))
        .map(|(_, key)| key.clone())
        .collect()
}

async fn compute<V, T, E>(config: &CacheConfig<V>, cache: CacheName, source: impl Future<Output = Result<T, E>>) -> Result<T, E> {
    let watch = Stopwatch::start(config.clock());
    let result = source.await;
    let activity = if result.is_ok() {
        CacheActivity::Computed
    } else {
        CacheActivity::Error
    };
    config
        .telemetry()
        .record(cache, CacheOperation::Compute, activity, Some(watch.elapsed()));
    result
}

async fn bypass<V, T>(config: &CacheConfig<V>, cache: CacheName, source: impl Future<Output = T>) -> T {
    config.telemetry().record(cache, CacheOperation::Compute, CacheActivity::Bypass, None);
    source.await
}
