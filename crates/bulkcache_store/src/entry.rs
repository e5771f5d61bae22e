// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    ops::Deref,
    time::{Duration, SystemTime},
};

/// A stored value with the metadata needed to decide whether it is still live.
///
/// Stores create a `CacheEntry` when a value is written and never mutate it afterwards.
/// The entry is considered expired once the clock passes `cached_at + ttl`. An entry without
/// a TTL (or whose expiry would overflow `SystemTime`) never expires.
///
/// # Examples
///
/// ```
/// use bulkcache_store::CacheEntry;
/// use std::time::{Duration, SystemTime};
///
/// let now = SystemTime::UNIX_EPOCH;
/// let entry = CacheEntry::new("data", Duration::from_secs(60), now);
///
/// assert_eq!(*entry.value(), "data");
/// assert!(!entry.is_expired(now + Duration::from_secs(59)));
/// assert!(entry.is_expired(now + Duration::from_secs(60)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    cached_at: SystemTime,
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry written at `cached_at` that lives for `ttl`.
    ///
    /// A `ttl` of [`Duration::MAX`] means the entry never expires.
    pub fn new(value: V, ttl: Duration, cached_at: SystemTime) -> Self {
        Self {
            value,
            cached_at,
            ttl: (ttl != Duration::MAX).then_some(ttl),
        }
    }

    /// Creates an entry that never expires.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache_store::CacheEntry;
    /// use std::time::{Duration, SystemTime};
    ///
    /// let entry = CacheEntry::forever(42, SystemTime::UNIX_EPOCH);
    /// assert!(entry.ttl().is_none());
    /// assert!(entry.expires_at().is_none());
    /// ```
    pub fn forever(value: V, cached_at: SystemTime) -> Self {
        Self {
            value,
            cached_at,
            ttl: None,
        }
    }

    /// Returns the time the entry was written.
    #[must_use]
    pub fn cached_at(&self) -> SystemTime {
        self.cached_at
    }

    /// Returns the entry's time-to-live, or `None` if it never expires.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the instant after which the entry is no longer visible.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.ttl.and_then(|ttl| self.cached_at.checked_add(ttl))
    }

    /// Returns `true` if the entry is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns how long the entry has left to live at `now`.
    ///
    /// Returns `None` for entries that never expire and `Some(Duration::ZERO)` for expired ones.
    #[must_use]
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.expires_at()
            .map(|expires_at| expires_at.duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns a reference to the stored value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
