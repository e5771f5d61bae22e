// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rebuilding typed result containers from cached and computed values.
//!
//! Multi-key operations return the same container type the data source returns. The engine
//! takes the source's container apart with [`Container::into_computed`], merges its values with
//! the cache hits, and builds a fresh container in request order with
//! [`ResultAssembler::assemble`].

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::{BuildHasher, Hash},
};

use crate::{CacheKey, Error};

/// The shape of a result container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Fixed positions, one per requested identity; positions without a value stay empty.
    Array,
    /// Values in request order; identities without a value are skipped.
    OrderedList,
    /// Values without order or duplicates.
    Set,
    /// Values keyed by identity.
    Map,
}

/// What a data source returned, taken out of its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Computed<I, V> {
    /// Bare values; identities are recovered with the operation's
    /// [`IdentityRule`](crate::IdentityRule).
    Values(Vec<V>),
    /// Values already paired with their identities.
    Keyed(Vec<(I, V)>),
}

impl<I, V> Computed<I, V> {
    /// Returns the number of computed items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Values(values) => values.len(),
            Self::Keyed(pairs) => pairs.len(),
        }
    }

    /// Returns `true` if the source computed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A result container the engine can take apart and rebuild.
///
/// The engine calls [`with_slots`](Self::with_slots) with the number of requested identities,
/// then [`put`](Self::put) once for every requested slot that resolved to a value, in request
/// order. Implement this trait to use your own container type as a multi-key result.
///
/// # Examples
///
/// ```
/// use bulkcache::{Computed, Container, Error, Layout};
///
/// /// Keeps only the first resolved value.
/// struct First<V>(Option<V>);
///
/// impl<I, V> Container<I, V> for First<V> {
///     const LAYOUT: Layout = Layout::OrderedList;
///
///     fn with_slots(_len: usize) -> Result<Self, Error> {
///         Ok(Self(None))
///     }
///
///     fn put(&mut self, _slot: usize, _identity: I, value: V) {
///         self.0.get_or_insert(value);
///     }
///
///     fn into_computed(self) -> Computed<I, V> {
///         Computed::Values(self.0.into_iter().collect())
///     }
/// }
/// ```
pub trait Container<I, V>: Sized {
    /// The shape of this container.
    const LAYOUT: Layout;

    /// Creates an empty container for `len` requested identities.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Assembly`](crate::ErrorKind::Assembly) error if the container
    /// cannot hold `len` slots.
    fn with_slots(len: usize) -> Result<Self, Error>;

    /// Stores the value resolved for the requested slot at index `slot`.
    fn put(&mut self, slot: usize, identity: I, value: V);

    /// Takes the container apart into the items it holds.
    fn into_computed(self) -> Computed<I, V>;
}

impl<I, V, const N: usize> Container<I, V> for [Option<V>; N] {
    const LAYOUT: Layout = Layout::Array;

    fn with_slots(len: usize) -> Result<Self, Error> {
        if len != N {
            return Err(Error::assembly(format!(
                "an array of length {N} cannot hold {len} requested identities"
            )));
        }
        Ok(std::array::from_fn(|_| None))
    }

    fn put(&mut self, slot: usize, _identity: I, value: V) {
        if let Some(cell) = self.get_mut(slot) {
            *cell = Some(value);
        }
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self.into_iter().flatten().collect())
    }
}

impl<I, V> Container<I, V> for Box<[Option<V>]> {
    const LAYOUT: Layout = Layout::Array;

    fn with_slots(len: usize) -> Result<Self, Error> {
        Ok(std::iter::repeat_with(|| None).take(len).collect())
    }

    fn put(&mut self, slot: usize, _identity: I, value: V) {
        if let Some(cell) = self.get_mut(slot) {
            *cell = Some(value);
        }
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self.into_vec().into_iter().flatten().collect())
    }
}

impl<I, V> Container<I, V> for Vec<V> {
    const LAYOUT: Layout = Layout::OrderedList;

    fn with_slots(len: usize) -> Result<Self, Error> {
        Ok(Self::with_capacity(len))
    }

    fn put(&mut self, _slot: usize, _identity: I, value: V) {
        self.push(value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self)
    }
}

impl<I, V> Container<I, V> for VecDeque<V> {
    const LAYOUT: Layout = Layout::OrderedList;

    fn with_slots(len: usize) -> Result<Self, Error> {
        Ok(Self::with_capacity(len))
    }

    fn put(&mut self, _slot: usize, _identity: I, value: V) {
        self.push_back(value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self.into())
    }
}

impl<I, V, S> Container<I, V> for HashSet<V, S>
where
    V: Eq + Hash,
    S: BuildHasher + Default,
{
    const LAYOUT: Layout = Layout::Set;

    fn with_slots(len: usize) -> Result<Self, Error> {
        Ok(Self::with_capacity_and_hasher(len, S::default()))
    }

    fn put(&mut self, _slot: usize, _identity: I, value: V) {
        self.insert(value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self.into_iter().collect())
    }
}

impl<I, V> Container<I, V> for BTreeSet<V>
where
    V: Ord,
{
    const LAYOUT: Layout = Layout::Set;

    fn with_slots(_len: usize) -> Result<Self, Error> {
        Ok(Self::new())
    }

    fn put(&mut self, _slot: usize, _identity: I, value: V) {
        self.insert(value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Values(self.into_iter().collect())
    }
}

impl<I, V, S> Container<I, V> for HashMap<I, V, S>
where
    I: Eq + Hash,
    S: BuildHasher + Default,
{
    const LAYOUT: Layout = Layout::Map;

    fn with_slots(len: usize) -> Result<Self, Error> {
        Ok(Self::with_capacity_and_hasher(len, S::default()))
    }

    fn put(&mut self, _slot: usize, identity: I, value: V) {
        self.insert(identity, value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Keyed(self.into_iter().collect())
    }
}

impl<I, V> Container<I, V> for BTreeMap<I, V>
where
    I: Ord,
{
    const LAYOUT: Layout = Layout::Map;

    fn with_slots(_len: usize) -> Result<Self, Error> {
        Ok(Self::new())
    }

    fn put(&mut self, _slot: usize, identity: I, value: V) {
        self.insert(identity, value);
    }

    fn into_computed(self) -> Computed<I, V> {
        Computed::Keyed(self.into_iter().collect())
    }
}

/// Builds result containers in request order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    /// Builds a `C` holding the value of every requested slot that has one.
    ///
    /// `slots` is the request in caller order, one `(identity, key)` pair per requested
    /// identity. `values` maps cache keys to resolved values and must not contain sentinels.
    /// Slots sharing a key all receive the value.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Assembly`](crate::ErrorKind::Assembly) error if `C` cannot be
    /// created for `slots.len()` slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkcache::ResultAssembler;
    /// use std::collections::HashMap;
    ///
    /// let slots = vec![(1, "k1".to_string()), (2, "k2".to_string()), (3, "k3".to_string())];
    /// let values = HashMap::from([("k3".to_string(), "c"), ("k1".to_string(), "a")]);
    ///
    /// let list: Vec<&str> = ResultAssembler::assemble(&slots, &values)?;
    /// assert_eq!(list, ["a", "c"]);
    ///
    /// let array: [Option<&str>; 3] = ResultAssembler::assemble(&slots, &values)?;
    /// assert_eq!(array, [Some("a"), None, Some("c")]);
    /// # Ok::<(), bulkcache::Error>(())
    /// ```
    pub fn assemble<C, I, V>(slots: &[(I, CacheKey)], values: &HashMap<CacheKey, V>) -> Result<C, Error>
    where
        C: Container<I, V>,
        I: Clone,
        V: Clone,
    {
        let mut container = C::with_slots(slots.len())?;
        for (slot, (identity, key)) in slots.iter().enumerate() {
            if let Some(value) = values.get(key) {
                container.put(slot, identity.clone(), value.clone());
            }
        }
        Ok(container)
    }
}
