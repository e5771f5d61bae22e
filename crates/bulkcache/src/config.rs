// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Engine configuration: named stores and the switches that apply to every operation.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use bulkcache_store::{CacheStore, DynamicStore, DynamicStoreExt};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::MeterProvider;
use tick::Clock;

use crate::{
    CacheName, Error, Gate, HitCollector, Stored, Ttl,
    telemetry::{CacheTelemetry, config::TelemetryConfig},
    traced::TracedStore,
};

/// Default lifetime of a sentinel entry.
pub const DEFAULT_SENTINEL_TTL: Duration = Duration::from_secs(60);

/// The immutable configuration shared by all calls of a [`CacheOrchestrator`](crate::CacheOrchestrator).
///
/// Holds the named stores values are cached in, the global caching switch, the penetration
/// protection switch, the sentinel TTL, an optional hit collector and telemetry settings.
///
/// # Examples
///
/// ```
/// use bulkcache::CacheConfig;
/// use std::time::Duration;
/// use tick::Clock;
///
/// let config = CacheConfig::<String>::builder(Clock::new_frozen())
///     .memory("users")
///     .prevent_penetration(true)
///     .sentinel_ttl(Duration::from_secs(30))
///     .build();
///
/// assert!(config.is_enabled());
/// assert!(config.prevents_penetration());
/// assert!(config.store("users").is_ok());
/// assert!(config.store("orders").is_err());
/// ```
pub struct CacheConfig<V> {
    stores: HashMap<CacheName, DynamicStore<Stored<V>>>,
    enabled: bool,
    prevent_penetration: bool,
    sentinel_ttl: Duration,
    hit_collector: Option<Arc<dyn HitCollector>>,
    telemetry: CacheTelemetry,
    clock: Clock,
}

impl<V> CacheConfig<V> {
    /// Creates a builder with caching enabled, penetration protection off and no stores.
    #[must_use]
    pub fn builder(clock: Clock) -> CacheConfigBuilder<V> {
        CacheConfigBuilder::new(clock)
    }

    /// Returns `true` if caching is globally enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if sentinels are written for keys the data source has no value for.
    #[must_use]
    pub fn prevents_penetration(&self) -> bool {
        self.prevent_penetration
    }

    /// Returns the configured sentinel TTL before capping.
    #[must_use]
    pub fn sentinel_ttl(&self) -> Duration {
        self.sentinel_ttl
    }

    /// Returns the TTL sentinels are written with for an operation with `ttl`.
    ///
    /// A sentinel never outlives the values of its operation.
    #[must_use]
    pub fn sentinel_ttl_for(&self, ttl: Ttl) -> Duration {
        self.sentinel_ttl.min(ttl.as_duration())
    }

    /// Returns the clock used for timing store calls.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the names of all registered stores.
    pub fn cache_names(&self) -> impl Iterator<Item = CacheName> + '_ {
        self.stores.keys().copied()
    }

    /// Returns the store registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error if no store
    /// is registered under `name`.
    pub fn store(&self, name: CacheName) -> Result<&DynamicStore<Stored<V>>, Error> {
        self.stores
            .get(name)
            .ok_or_else(|| Error::configuration(format!("no store is registered under '{name}'")))
    }

    /// Decides whether a call with `ttl`, `gate` and `args` goes through the cache.
    ///
    /// Caching is inactive when it is globally disabled or `ttl` is [`Ttl::NO_CACHE`]; the gate is
    /// not evaluated in either case. Otherwise a missing gate means active.
    ///
    /// # Errors
    ///
    /// Returns the gate's evaluation error.
    pub fn is_caching_active<A>(&self, ttl: Ttl, gate: Option<&Gate<A>>, args: &A) -> Result<bool, Error> {
        if !self.enabled || ttl.is_no_cache() {
            return Ok(false);
        }
        gate.map_or(Ok(true), |gate| gate.evaluate(args))
    }

    pub(crate) fn traced(&self, name: CacheName) -> Result<TracedStore<'_, V>, Error> {
        let store = self.store(name)?;
        Ok(TracedStore::new(name, store, &self.telemetry, &self.clock))
    }

    pub(crate) fn telemetry(&self) -> &CacheTelemetry {
        &self.telemetry
    }

    pub(crate) fn record_hit(&self, name: CacheName, hit: bool) {
        if let Some(collector) = &self.hit_collector {
            collector.record(name, hit);
        }
    }
}

impl<V> fmt::Debug for CacheConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.stores.keys().collect();
        names.sort_unstable();
        f.debug_struct("CacheConfig")
            .field("stores", &names)
            .field("enabled", &self.enabled)
            .field("prevent_penetration", &self.prevent_penetration)
            .field("sentinel_ttl", &self.sentinel_ttl)
            .field("hit_collector", &self.hit_collector.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CacheConfig`].
///
/// Registering two stores under the same name keeps the last one.
///
/// # Examples
///
/// ```
/// use bulkcache::{CacheConfig, HitRateCounter};
/// use bulkcache_memory::InMemoryStore;
/// use std::sync::Arc;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let counter = Arc::new(HitRateCounter::new());
///
/// let config = CacheConfig::<u64>::builder(clock.clone())
///     .store("scores", InMemoryStore::builder(clock).max_capacity(10_000).build())
///     .hit_collector(Arc::clone(&counter))
///     .logs()
///     .build();
///
/// assert_eq!(config.cache_names().collect::<Vec<_>>(), ["scores"]);
/// ```
pub struct CacheConfigBuilder<V> {
    stores: HashMap<CacheName, DynamicStore<Stored<V>>>,
    enabled: bool,
    prevent_penetration: bool,
    sentinel_ttl: Duration,
    hit_collector: Option<Arc<dyn HitCollector>>,
    telemetry: TelemetryConfig,
    clock: Clock,
}

impl<V> CacheConfigBuilder<V> {
    fn new(clock: Clock) -> Self {
        Self {
            stores: HashMap::new(),
            enabled: true,
            prevent_penetration: false,
            sentinel_ttl: DEFAULT_SENTINEL_TTL,
            hit_collector: None,
            telemetry: TelemetryConfig::new(),
            clock,
        }
    }

    /// Registers `store` under `name`.
    #[must_use]
    pub fn store<S>(mut self, name: CacheName, store: S) -> Self
    where
        S: CacheStore<Stored<V>> + 'static,
    {
        self.stores.insert(name, store.into_dynamic());
        self
    }

    /// Registers an unbounded in-memory store under `name`, using the builder's clock.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self, name: CacheName) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let store = bulkcache_memory::InMemoryStore::builder(self.clock.clone()).name(name).build();
        self.store(name, store)
    }

    /// Turns caching on or off for every operation. Defaults to on.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Caches a sentinel for keys the data source has no value for. Defaults to off.
    #[must_use]
    pub fn prevent_penetration(mut self, prevent: bool) -> Self {
        self.prevent_penetration = prevent;
        self
    }

    /// Sets how long sentinels live. Defaults to 60 seconds.
    ///
    /// Sentinels are always capped to the TTL of the operation that writes them.
    #[must_use]
    pub fn sentinel_ttl(mut self, ttl: Duration) -> Self {
        self.sentinel_ttl = ttl;
        self
    }

    /// Reports every per-key hit and miss to `collector`.
    #[must_use]
    pub fn hit_collector(mut self, collector: impl HitCollector + 'static) -> Self {
        self.hit_collector = Some(Arc::new(collector));
        self
    }

    /// Emits a `tracing` event for every store call.
    #[must_use]
    pub fn logs(mut self) -> Self {
        self.telemetry = self.telemetry.with_logs();
        self
    }

    /// Records `OpenTelemetry` metrics for every store call.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.telemetry = self.telemetry.with_metrics(provider);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> CacheConfig<V> {
        CacheConfig {
            stores: self.stores,
            enabled: self.enabled,
            prevent_penetration: self.prevent_penetration,
            sentinel_ttl: self.sentinel_ttl,
            hit_collector: self.hit_collector,
            telemetry: self.telemetry.build(),
            clock: self.clock,
        }
    }
}

impl<V> fmt::Debug for CacheConfigBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfigBuilder")
            .field("stores", &self.stores.len())
            .field("enabled", &self.enabled)
            .field("prevent_penetration", &self.prevent_penetration)
            .field("sentinel_ttl", &self.sentinel_ttl)
            .finish_non_exhaustive()
    }
}
