// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Two-tier stores with read promotion.

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    sync::Arc,
    time::Duration,
};

use bulkcache_store::{CacheKey, CacheStore};
use futures::join;

/// Decides whether a value found only in the fallback tier is copied into the primary tier.
///
/// # Examples
///
/// ```
/// use bulkcache::{PromotionPolicy, Stored};
///
/// // Keep sentinels out of the primary tier.
/// let policy = PromotionPolicy::when(|stored: &Stored<String>| !stored.is_sentinel());
/// # let _ = policy;
///
/// let policy = PromotionPolicy::<Stored<String>>::never();
/// # let _ = policy;
/// ```
pub struct PromotionPolicy<V>(Policy<V>);

enum Policy<V> {
    Always,
    Never,
    When(Arc<dyn Fn(&V) -> bool + Send + Sync>),
}

impl<V> PromotionPolicy<V> {
    /// Promotes every fallback hit. This is the default.
    #[must_use]
    pub fn always() -> Self {
        Self(Policy::Always)
    }

    /// Never promotes.
    #[must_use]
    pub fn never() -> Self {
        Self(Policy::Never)
    }

    /// Promotes the values `predicate` accepts.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self(Policy::When(Arc::new(predicate)))
    }

    fn should_promote(&self, value: &V) -> bool {
        match &self.0 {
            Policy::Always => true,
            Policy::Never => false,
            Policy::When(predicate) => predicate(value),
        }
    }
}

impl<V> Default for PromotionPolicy<V> {
    fn default() -> Self {
        Self::always()
    }
}

impl<V> Debug for PromotionPolicy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Policy::Always => f.write_str("Always"),
            Policy::Never => f.write_str("Never"),
            Policy::When(_) => f.write_str("When(<closure>)"),
        }
    }
}

/// A store that reads a primary tier first and a fallback tier for whatever the primary misses.
///
/// Fallback hits accepted by the [`PromotionPolicy`] are written to the primary tier with the
/// promotion TTL. Writes and removals go to both tiers concurrently; the primary tier's error is
/// reported first. Read errors from the primary tier are treated as misses, and failed
/// promotions are ignored.
///
/// # Examples
///
/// ```
/// use bulkcache::{CacheConfig, Stored, TieredStore};
/// use bulkcache_memory::InMemoryStore;
/// use std::time::Duration;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let near = InMemoryStore::<Stored<String>>::builder(clock.clone()).max_capacity(1_000).build();
/// let far = InMemoryStore::<Stored<String>>::new(clock.clone());
///
/// let config = CacheConfig::<String>::builder(clock)
///     .store("users", TieredStore::new(near, far, Duration::from_secs(30)))
///     .build();
/// # let _ = config;
/// ```
pub struct TieredStore<P, F, V> {
    primary: P,
    fallback: F,
    policy: PromotionPolicy<V>,
    promotion_ttl: Duration,
}

impl<P, F, V> TieredStore<P, F, V> {
    /// Creates a tiered store that promotes every fallback hit for `promotion_ttl`.
    #[must_use]
    pub fn new(primary: P, fallback: F, promotion_ttl: Duration) -> Self {
        Self {
            primary,
            fallback,
            policy: PromotionPolicy::always(),
            promotion_ttl,
        }
    }

    /// Replaces the promotion policy.
    #[must_use]
    pub fn promotion_policy(mut self, policy: PromotionPolicy<V>) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the primary tier.
    #[must_use]
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Returns the fallback tier.
    #[must_use]
    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P, F, V> Debug for TieredStore<P, F, V>
where
    P: Debug,
    F: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredStore")
            .field("primary", &self.primary)
            .field("fallback", &self.fallback)
            .field("policy", &self.policy)
            .field("promotion_ttl", &self.promotion_ttl)
            .finish()
    }
}

impl<P, F, V> TieredStore<P, F, V>
where
    P: CacheStore<V>,
    F: CacheStore<V>,
    V: Clone + Send + Sync,
{
    async fn promote(&self, entries: HashMap<CacheKey, V>) {
        if entries.is_empty() {
            return;
        }
        if let Err(e) = self.primary.write_many(entries, self.promotion_ttl).await {
            tracing::debug!(error = %e, "promotion to the primary tier failed");
        }
    }
}

impl<P, F, V> CacheStore<V> for TieredStore<P, F, V>
where
    P: CacheStore<V>,
    F: CacheStore<V>,
    V: Clone + Send + Sync,
{
    async fn read(&self, key: &CacheKey) -> Result<Option<V>, bulkcache_store::Error> {
        match self.primary.read(key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "primary tier read failed; falling back"),
        }

        let value = Box::pin(self.fallback.read(key)).await?;

        if let Some(v) = &value
            && self.policy.should_promote(v)
        {
            self.promote(HashMap::from([(key.clone(), v.clone())])).await;
        }

        Ok(value)
    }

    async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, bulkcache_store::Error> {
        let mut found = match self.primary.read_many(keys).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(error = %e, "primary tier read_many failed; falling back");
                HashMap::new()
            }
        };

        let missing: Vec<CacheKey> = keys.iter().filter(|key| !found.contains_key(*key)).cloned().collect();
        if missing.is_empty() {
            return Ok(found);
        }

        let from_fallback = Box::pin(self.fallback.read_many(&missing)).await?;

        let promoted = from_fallback
            .iter()
            .filter(|(_, value)| self.policy.should_promote(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.promote(promoted).await;

        found.extend(from_fallback);
        Ok(found)
    }

    async fn write(&self, key: &CacheKey, value: V, ttl: Duration) -> Result<(), bulkcache_store::Error> {
        let (primary, fallback) = join!(
            Box::pin(self.primary.write(key, value.clone(), ttl)),
            Box::pin(self.fallback.write(key, value, ttl))
        );
        primary?;
        fallback
    }

    async fn write_many(&self, entries: HashMap<CacheKey, V>, ttl: Duration) -> Result<(), bulkcache_store::Error> {
        let (primary, fallback) = join!(
            Box::pin(self.primary.write_many(entries.clone(), ttl)),
            Box::pin(self.fallback.write_many(entries, ttl))
        );
        primary?;
        fallback
    }

    async fn contains_key(&self, key: &CacheKey) -> Result<bool, bulkcache_store::Error> {
        match self.primary.contains_key(key).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => tracing::debug!(error = %e, "primary tier contains_key failed; falling back"),
        }
        self.fallback.contains_key(key).await
    }

    async fn remove(&self, keys: &[CacheKey]) -> Result<(), bulkcache_store::Error> {
        let (primary, fallback) = join!(Box::pin(self.primary.remove(keys)), Box::pin(self.fallback.remove(keys)));
        primary?;
        fallback
    }

    async fn clear(&self) -> Result<(), bulkcache_store::Error> {
        let (primary, fallback) = join!(Box::pin(self.primary.clear()), Box::pin(self.fallback.clear()));
        primary?;
        fallback
    }

    fn len(&self) -> Option<u64> {
        self.primary.len()
    }
}
