// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hit-rate statistics.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;

use crate::CacheName;

/// Receives one event per looked-up key.
///
/// Implementations must be cheap and must not block: the orchestrator calls `record` inline on
/// every lookup. Recording cannot fail, so a broken sink never affects caching.
pub trait HitCollector: Send + Sync {
    /// Records a lookup of one key in the store named `cache`.
    fn record(&self, cache: CacheName, hit: bool);
}

impl<T> HitCollector for Arc<T>
where
    T: HitCollector + ?Sized,
{
    fn record(&self, cache: CacheName, hit: bool) {
        (**self).record(cache, hit);
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A [`HitCollector`] that counts hits and misses per store.
///
/// Counters are lock-free atomics; share the counter between the configuration and the code
/// reading it through an [`Arc`].
///
/// # Examples
///
/// ```
/// use bulkcache::{HitCollector, HitRateCounter};
///
/// let counter = HitRateCounter::new();
/// counter.record("users", true);
/// counter.record("users", true);
/// counter.record("users", false);
///
/// assert_eq!(counter.hits("users"), 2);
/// assert_eq!(counter.misses("users"), 1);
/// assert!((counter.hit_rate("users").unwrap() - 2.0 / 3.0).abs() < 1e-9);
/// assert_eq!(counter.hit_rate("orders"), None);
/// ```
#[derive(Debug, Default)]
pub struct HitRateCounter {
    counters: DashMap<CacheName, Counters>,
}

impl HitRateCounter {
    /// Creates a counter with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of hits recorded for `cache`.
    #[must_use]
    pub fn hits(&self, cache: CacheName) -> u64 {
        self.counters.get(&cache).map_or(0, |c| c.hits.load(Ordering::Relaxed))
    }

    /// Returns the number of misses recorded for `cache`.
    #[must_use]
    pub fn misses(&self, cache: CacheName) -> u64 {
        self.counters.get(&cache).map_or(0, |c| c.misses.load(Ordering::Relaxed))
    }

    /// Returns the fraction of lookups that hit, or `None` if `cache` saw no lookups.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "hit rates do not need exact counts")]
    pub fn hit_rate(&self, cache: CacheName) -> Option<f64> {
        let hits = self.hits(cache);
        let total = hits + self.misses(cache);
        (total > 0).then(|| hits as f64 / total as f64)
    }

    /// Resets every counter.
    pub fn reset(&self) {
        self.counters.clear();
    }
}

impl HitCollector for HitRateCounter {
    fn record(&self, cache: CacheName, hit: bool) {
        let counters = self.counters.entry(cache).or_default();
        let counter = if hit { &counters.hits } else { &counters.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_counted_separately() {
        let counter = HitRateCounter::new();
        counter.record("a", true);
        counter.record("b", false);

        assert_eq!((counter.hits("a"), counter.misses("a")), (1, 0));
        assert_eq!((counter.hits("b"), counter.misses("b")), (0, 1));
        assert_eq!(counter.hit_rate("b"), Some(0.0));
    }

    #[test]
    fn shared_counter_records_through_arc() {
        let counter = Arc::new(HitRateCounter::new());
        let collector: Arc<dyn HitCollector> = Arc::new(Arc::clone(&counter));

        collector.record("a", true);
        assert_eq!(counter.hits("a"), 1);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let counter = Arc::new(HitRateCounter::new());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let counter = Arc::clone(&counter);
                scope.spawn(move || {
                    for i in 0..1_000 {
                        counter.record("shared", i % 2 == 0);
                    }
                });
            }
        });

        assert_eq!(counter.hits("shared"), 2_000);
        assert_eq!(counter.misses("shared"), 2_000);
    }

    #[test]
    fn reset_clears_counts() {
        let counter = HitRateCounter::new();
        counter.record("a", true);
        counter.reset();
        assert_eq!(counter.hit_rate("a"), None);
    }
}
