// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reconciling computed values with the keys that missed.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use crate::{CacheKey, Computed, Error, IdentityRule, Stored};

/// Matches freshly computed values to the cache keys that missed.
///
/// The same reconciliation serves list-shaped results, whose identities are extracted with the
/// operation's identity rule, and map-shaped results, which arrive already keyed by identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueMerger;

impl KeyValueMerger {
    /// Resolves computed items to cache entries and shrinks `misses` accordingly.
    ///
    /// Each item's identity is mapped to its cache key through `identity_map`. Items whose key is
    /// not an outstanding miss of this request are dropped. When several items resolve to the
    /// same key the last one wins. With `prevent_penetration`, every key still in `misses`
    /// afterwards resolves to [`Stored::Sentinel`]; those keys stay in `misses`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `computed` holds bare values and no identity rule is
    /// given, or the rule's evaluation error if an identity cannot be extracted.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache::{Computed, IdentityRule, KeyValueMerger, Stored};
    /// use std::collections::{HashMap, HashSet};
    ///
    /// let identity_map = HashMap::from([(1, "k1".to_string()), (2, "k2".to_string())]);
    /// let mut misses = HashSet::from(["k1".to_string(), "k2".to_string()]);
    /// let rule = IdentityRule::new(|v: &(u32, String)| v.0);
    ///
    /// let resolved = KeyValueMerger::merge(
    ///     Computed::Values(vec![(1, "one".to_string())]),
    ///     Some(&rule),
    ///     &mut misses,
    ///     &identity_map,
    ///     true,
    /// )?;
    ///
    /// assert_eq!(resolved["k1"], Stored::Value((1, "one".to_string())));
    /// assert_eq!(resolved["k2"], Stored::Sentinel);
    /// assert_eq!(misses, HashSet::from(["k2".to_string()]));
    /// # Ok::<(), bulkcache::Error>(())
    /// ```
    pub fn merge<I, V>(
        computed: Computed<I, V>,
        identity_rule: Option<&IdentityRule<V, I>>,
        misses: &mut HashSet<CacheKey>,
        identity_map: &HashMap<I, CacheKey>,
        prevent_penetration: bool,
    ) -> Result<HashMap<CacheKey, Stored<V>>, Error>
    where
        I: Eq + Hash,
    {
        let mut resolved = HashMap::with_capacity(misses.len());

        let mut accept = |identity: &I, value: V| {
            let Some(key) = identity_map.get(identity) else {
                tracing::debug!("dropping computed value whose identity was not requested");
                return;
            };
            if misses.remove(key) || resolved.contains_key(key) {
                resolved.insert(key.clone(), Stored::Value(value));
            } else {
                tracing::debug!(cache.key = %key, "dropping computed value for a key that did not miss");
            }
        };

        match computed {
            Computed::Keyed(pairs) => {
                for (identity, value) in pairs {
                    accept(&identity, value);
                }
            }
            Computed::Values(values) => {
                let rule = identity_rule.ok_or_else(|| {
                    Error::configuration("the data source returned bare values but the operation has no identity rule")
                })?;
                for value in values {
                    let identity = rule.extract(&value)?;
                    accept(&identity, value);
                }
            }
        }

        if prevent_penetration {
            resolved.extend(misses.iter().map(|key| (key.clone(), Stored::Sentinel)));
        }

        Ok(resolved)
    }
}
