// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The value type the engine persists, including the "known absent" marker.

use serde::{Deserialize, Serialize};

/// A value as persisted in a [`CacheStore`](crate::CacheStore).
///
/// When penetration protection is enabled the engine caches [`Stored::Sentinel`] for keys the
/// data source had nothing for, so later lookups can answer "absent" without calling the
/// source again. The sentinel is recognized by its variant, never by comparing contents, so any
/// `V` (including empty strings or zero) remains a legitimate cached value.
///
/// Callers never see the sentinel: the engine strips it from every returned result. Stores see
/// it as an ordinary value and may persist it through the serde derives.
///
/// # Examples
///
/// ```
/// use bulkcache::Stored;
///
/// let hit = Stored::Value(String::new());
/// assert!(!hit.is_sentinel());
/// assert_eq!(hit.into_value(), Some(String::new()));
///
/// let absent = Stored::<String>::Sentinel;
/// assert!(absent.is_sentinel());
/// assert_eq!(absent.into_value(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stored<V> {
    /// A real value produced by the data source.
    Value(V),
    /// The data source confirmed there is no value for this key.
    Sentinel,
}

impl<V> Stored<V> {
    /// Returns `true` for the "known absent" marker.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }

    /// Strips the sentinel, returning the real value if there is one.
    #[must_use]
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Value(value) => Some(value),
            Self::Sentinel => None,
        }
    }

    /// Returns a reference to the real value, if there is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Self::Value(value) => Some(value),
            Self::Sentinel => None,
        }
    }
}

impl<V> From<V> for Stored<V> {
    fn from(value: V) -> Self {
        Self::Value(value)
    }
}
