// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-operation configuration objects.
//!
//! An operation names the store it caches into, how keys are derived from call arguments, when
//! caching applies and for how long entries live. Operations are plain values: build them once
//! (typically next to the function they cache) and pass them to every
//! [`CacheOrchestrator`](crate::CacheOrchestrator) call.

use std::{fmt, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};

use crate::{CacheKey, CacheName, Error, ExpressionEvaluator};

/// How long entries written by an operation live.
///
/// [`Ttl::NO_CACHE`] disables caching for the operation entirely, regardless of its gate.
/// [`Ttl::FOREVER`] writes entries that never expire.
///
/// # Examples
///
/// ```
/// use bulkcache::Ttl;
/// use std::time::Duration;
///
/// assert_eq!(Ttl::from_millis(1_500).as_duration(), Duration::from_millis(1_500));
/// assert!(Ttl::from_millis(0).is_no_cache());
/// assert!(Ttl::FOREVER.is_forever());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    /// Disables caching for the operation.
    pub const NO_CACHE: Self = Self(Duration::ZERO);

    /// Entries never expire.
    pub const FOREVER: Self = Self(Duration::MAX);

    /// Creates a TTL from milliseconds. Zero means [`Ttl::NO_CACHE`].
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Creates a TTL from a duration. [`Duration::ZERO`] means [`Ttl::NO_CACHE`].
    #[must_use]
    pub const fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns `true` if this TTL disables caching.
    #[must_use]
    pub fn is_no_cache(self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if entries never expire.
    #[must_use]
    pub fn is_forever(self) -> bool {
        self.0 == Duration::MAX
    }

    /// Returns the TTL as a duration, as passed to [`CacheStore`](crate::CacheStore) writes.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self::FOREVER
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

type GateFn<A> = dyn Fn(&A) -> Result<bool, Error> + Send + Sync;

/// Decides per call whether caching applies.
///
/// When the gate is false the data source is called directly and the store is never touched.
///
/// # Examples
///
/// ```
/// use bulkcache::Gate;
///
/// struct Query {
///     tenant: Option<String>,
/// }
///
/// // Only cache tenant-scoped lookups.
/// let gate = Gate::new(|q: &Query| q.tenant.is_some());
/// assert!(gate.evaluate(&Query { tenant: Some("contoso".into()) })?);
/// assert!(!gate.evaluate(&Query { tenant: None })?);
/// # Ok::<(), bulkcache::Error>(())
/// ```
pub struct Gate<A>(Arc<GateFn<A>>);

impl<A> Gate<A> {
    /// Creates a gate from an infallible condition.
    pub fn new<F>(condition: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |args| Ok(condition(args))))
    }

    /// Creates a gate from a condition that may fail.
    ///
    /// Failures surface from the orchestrator as evaluation errors and abort the call.
    pub fn try_new<F>(condition: F) -> Self
    where
        F: Fn(&A) -> Result<bool, Error> + Send + Sync + 'static,
    {
        Self(Arc::new(condition))
    }

    /// Creates a gate that evaluates `expression` against the serialized arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache::{Gate, JsonPointerEvaluator};
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Query {
    ///     cacheable: bool,
    /// }
    ///
    /// let gate = Gate::expression(JsonPointerEvaluator, "/cacheable");
    /// assert!(gate.evaluate(&Query { cacheable: true })?);
    /// # Ok::<(), bulkcache::Error>(())
    /// ```
    pub fn expression<E>(evaluator: E, expression: impl Into<String>) -> Self
    where
        E: ExpressionEvaluator + Send + Sync + 'static,
        A: Serialize + 'static,
    {
        let expression = expression.into();
        Self(Arc::new(move |args| evaluator.evaluate(&expression, args)))
    }

    /// Evaluates the gate for one call.
    ///
    /// # Errors
    ///
    /// Returns the error produced by a fallible or expression-backed condition.
    pub fn evaluate(&self, args: &A) -> Result<bool, Error> {
        (self.0)(args)
    }
}

impl<A> Clone for Gate<A> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<A> fmt::Debug for Gate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gate(<closure>)")
    }
}

type IdentityFn<V, I> = dyn Fn(&V) -> Result<I, Error> + Send + Sync;

/// Extracts the identity of one item returned by the data source.
///
/// Multi-key operations whose source returns a list, set or array need an identity rule to
/// correlate each computed value with the requested identity (and therefore the cache key) it
/// answers. Map-shaped results are already keyed by identity and do not need one.
pub struct IdentityRule<V, I>(Arc<IdentityFn<V, I>>);

impl<V, I> IdentityRule<V, I> {
    /// Creates a rule from an infallible extractor.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache::IdentityRule;
    ///
    /// #[derive(Clone)]
    /// struct User {
    ///     id: u64,
    /// }
    ///
    /// let rule = IdentityRule::new(|user: &User| user.id);
    /// assert_eq!(rule.extract(&User { id: 3 })?, 3);
    /// # Ok::<(), bulkcache::Error>(())
    /// ```
    pub fn new<F>(extract: F) -> Self
    where
        V: 'static,
        I: 'static,
        F: Fn(&V) -> I + Send + Sync + 'static,
    {
        Self(Arc::new(move |item| Ok(extract(item))))
    }

    /// Creates a rule from an extractor that may fail.
    pub fn try_new<F>(extract: F) -> Self
    where
        F: Fn(&V) -> Result<I, Error> + Send + Sync + 'static,
    {
        Self(Arc::new(extract))
    }

    /// Creates a rule that evaluates `expression` against each serialized item.
    pub fn expression<E>(evaluator: E, expression: impl Into<String>) -> Self
    where
        E: ExpressionEvaluator + Send + Sync + 'static,
        V: Serialize + 'static,
        I: DeserializeOwned + 'static,
    {
        let expression = expression.into();
        Self(Arc::new(move |item| evaluator.extract_identity(&expression, item)))
    }

    /// Extracts the identity of `item`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by a fallible or expression-backed extractor.
    pub fn extract(&self, item: &V) -> Result<I, Error> {
        (self.0)(item)
    }
}

impl<V, I> Clone for IdentityRule<V, I> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V, I> fmt::Debug for IdentityRule<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityRule(<closure>)")
    }
}

type SingleKeyFn<A> = dyn Fn(&A) -> CacheKey + Send + Sync;

/// A cached operation that resolves one key per call.
///
/// # Examples
///
/// ```
/// use bulkcache::{Gate, SingleKey, Ttl};
///
/// struct GetUser {
///     id: u64,
///     include_deleted: bool,
/// }
///
/// let op = SingleKey::new("users", |args: &GetUser| format!("user:{}", args.id))
///     .gate(Gate::new(|args: &GetUser| !args.include_deleted))
///     .ttl(Ttl::from_millis(60_000));
///
/// assert_eq!(op.cache(), "users");
/// assert_eq!(op.key(&GetUser { id: 7, include_deleted: false }), "user:7");
/// ```
pub struct SingleKey<A> {
    cache: CacheName,
    key: Arc<SingleKeyFn<A>>,
    gate: Option<Gate<A>>,
    ttl: Ttl,
}

impl<A> SingleKey<A> {
    /// Creates an operation caching into the store named `cache`, with keys derived by `key`.
    ///
    /// The operation has no gate and caches forever until configured otherwise.
    pub fn new<F>(cache: CacheName, key: F) -> Self
    where
        F: Fn(&A) -> CacheKey + Send + Sync + 'static,
    {
        Self {
            cache,
            key: Arc::new(key),
            gate: None,
            ttl: Ttl::default(),
        }
    }

    /// Sets the condition under which caching applies.
    #[must_use]
    pub fn gate(mut self, gate: Gate<A>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets how long written entries live.
    #[must_use]
    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = ttl.into();
        self
    }

    /// Returns the name of the store this operation caches into.
    #[must_use]
    pub fn cache(&self) -> CacheName {
        self.cache
    }

    /// Derives the cache key for one call.
    #[must_use]
    pub fn key(&self, args: &A) -> CacheKey {
        (self.key)(args)
    }

    /// Returns the TTL of written entries.
    #[must_use]
    pub fn time_to_live(&self) -> Ttl {
        self.ttl
    }

    pub(crate) fn gate_ref(&self) -> Option<&Gate<A>> {
        self.gate.as_ref()
    }
}

impl<A> Clone for SingleKey<A> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache,
            key: Arc::clone(&self.key),
            gate: self.gate.clone(),
            ttl: self.ttl,
        }
    }
}

impl<A> fmt::Debug for SingleKey<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleKey")
            .field("cache", &self.cache)
            .field("gate", &self.gate)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

type MultiKeyFn<A, I> = dyn Fn(&A, &I) -> CacheKey + Send + Sync;

/// A cached operation that resolves many keys per call.
///
/// Each call carries the shared arguments `A` and a list of identities `I`; the key rule derives
/// one cache key per identity. On a partial hit the data source is called with only the
/// identities whose keys are missing.
///
/// # Examples
///
/// ```
/// use bulkcache::{IdentityRule, MultiKey, Ttl};
///
/// #[derive(Clone)]
/// struct User {
///     id: u64,
/// }
///
/// let op: MultiKey<(), u64, User> = MultiKey::new("users", |_: &(), id: &u64| format!("user:{id}"))
///     .identity(IdentityRule::new(|user: &User| user.id))
///     .ttl(Ttl::from_millis(30_000));
///
/// assert_eq!(op.key(&(), &9), "user:9");
/// ```
pub struct MultiKey<A, I, V> {
    cache: CacheName,
    key: Arc<MultiKeyFn<A, I>>,
    identity: Option<IdentityRule<V, I>>,
    gate: Option<Gate<A>>,
    ttl: Ttl,
}

impl<A, I, V> MultiKey<A, I, V> {
    /// Creates an operation caching into the store named `cache`, with keys derived by `key`.
    ///
    /// The operation has no gate, no identity rule and caches forever until configured otherwise.
    pub fn new<F>(cache: CacheName, key: F) -> Self
    where
        F: Fn(&A, &I) -> CacheKey + Send + Sync + 'static,
    {
        Self {
            cache,
            key: Arc::new(key),
            identity: None,
            gate: None,
            ttl: Ttl::default(),
        }
    }

    /// Sets the rule correlating computed values with requested identities.
    ///
    /// Required unless the data source returns a map keyed by identity.
    #[must_use]
    pub fn identity(mut self, rule: IdentityRule<V, I>) -> Self {
        self.identity = Some(rule);
        self
    }

    /// Sets the condition under which caching applies.
    #[must_use]
    pub fn gate(mut self, gate: Gate<A>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets how long written entries live.
    #[must_use]
    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = ttl.into();
        self
    }

    /// Returns the name of the store this operation caches into.
    #[must_use]
    pub fn cache(&self) -> CacheName {
        self.cache
    }

    /// Derives the cache key for one identity.
    #[must_use]
    pub fn key(&self, args: &A, identity: &I) -> CacheKey {
        (self.key)(args, identity)
    }

    /// Returns the TTL of written entries.
    #[must_use]
    pub fn time_to_live(&self) -> Ttl {
        self.ttl
    }

    pub(crate) fn identity_ref(&self) -> Option<&IdentityRule<V, I>> {
        self.identity.as_ref()
    }

    pub(crate) fn gate_ref(&self) -> Option<&Gate<A>> {
        self.gate.as_ref()
    }
}

impl<A, I, V> Clone for MultiKey<A, I, V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache,
            key: Arc::clone(&self.key),
            identity: self.identity.clone(),
            gate: self.gate.clone(),
            ttl: self.ttl,
        }
    }
}

impl<A, I, V> fmt::Debug for MultiKey<A, I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiKey")
            .field("cache", &self.cache)
            .field("identity", &self.identity)
            .field("gate", &self.gate)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, JsonPointerEvaluator};

    #[test]
    fn ttl_constants() {
        assert!(Ttl::NO_CACHE.is_no_cache());
        assert!(!Ttl::NO_CACHE.is_forever());
        assert!(Ttl::FOREVER.is_forever());
        assert_eq!(Ttl::default(), Ttl::FOREVER);
        assert_eq!(Ttl::from(Duration::from_secs(2)), Ttl::from_millis(2_000));
    }

    #[test]
    fn fallible_gate_reports_errors() {
        let gate = Gate::try_new(|n: &u32| {
            if *n == 0 {
                Err(Error::evaluation("zero is not allowed"))
            } else {
                Ok(true)
            }
        });

        assert!(gate.evaluate(&1).expect("evaluation failed"));
        let err = gate.evaluate(&0).expect_err("zero should fail");
        assert_eq!(err.kind(), ErrorKind::Evaluation);
    }

    #[test]
    fn expression_identity_rule_decodes_items() {
        #[derive(Serialize)]
        struct Item {
            sku: String,
        }

        let rule: IdentityRule<Item, String> = IdentityRule::expression(JsonPointerEvaluator, "/sku");
        assert_eq!(rule.extract(&Item { sku: "A-1".into() }).expect("extraction failed"), "A-1");
    }

    #[test]
    fn operations_default_to_ungated_forever() {
        let single = SingleKey::new("c", |n: &u32| n.to_string());
        assert!(single.gate_ref().is_none());
        assert_eq!(single.time_to_live(), Ttl::FOREVER);

        let multi: MultiKey<(), u32, u32> = MultiKey::new("c", |_: &(), n: &u32| n.to_string());
        assert!(multi.identity_ref().is_none());
        assert!(multi.gate_ref().is_none());
        assert_eq!(multi.time_to_live(), Ttl::FOREVER);
    }

    #[test]
    fn clones_share_rules() {
        let op = SingleKey::new("c", |n: &u32| format!("k{n}")).ttl(Ttl::from_millis(5));
        let clone = op.clone();
        assert_eq!(clone.key(&4), "k4");
        assert_eq!(clone.time_to_live(), Ttl::from_millis(5));
        assert!(format!("{clone:?}").contains("SingleKey"));
    }
}
