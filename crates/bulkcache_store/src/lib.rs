// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage backend contract for batched caching.
//!
//! This crate defines the [`CacheStore`] trait that every backend used by the `bulkcache`
//! engine must satisfy, together with [`CacheEntry`] for values carrying expiry metadata and
//! the backend [`Error`] type.
//!
//! # Overview
//!
//! Stores are keyed by [`CacheKey`] strings and expose both single-key and batched operations.
//! The engine decides *what* to read and write; the store decides *how*: eviction, transport
//! and atomicity of individual calls are backend concerns.
//!
//! # Implementing a Store
//!
//! ```
//! use bulkcache_store::{CacheKey, CacheStore, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! struct SimpleStore<V>(RwLock<HashMap<CacheKey, V>>);
//!
//! impl<V> CacheStore<V> for SimpleStore<V>
//! where
//!     V: Clone + Send + Sync,
//! {
//!     async fn read(&self, key: &CacheKey) -> Result<Option<V>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, V>, Error> {
//!         let data = self.0.read().unwrap();
//!         Ok(keys.iter().filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone()))).collect())
//!     }
//!
//!     async fn write(&self, key: &CacheKey, value: V, _ttl: Duration) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.clone(), value);
//!         Ok(())
//!     }
//!
//!     async fn write_many(&self, entries: HashMap<CacheKey, V>, _ttl: Duration) -> Result<(), Error> {
//!         self.0.write().unwrap().extend(entries);
//!         Ok(())
//!     }
//!
//!     async fn contains_key(&self, key: &CacheKey) -> Result<bool, Error> {
//!         Ok(self.0.read().unwrap().contains_key(key))
//!     }
//!
//!     async fn remove(&self, keys: &[CacheKey]) -> Result<(), Error> {
//!         let mut data = self.0.write().unwrap();
//!         keys.iter().for_each(|k| {
//!             data.remove(k);
//!         });
//!         Ok(())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! Enable the `dynamic-store` feature (on by default) for [`DynamicStore`], which wraps any
//! `CacheStore` in a clonable, type-erased container. The engine uses it to keep stores of
//! different concrete types in one registry.

mod entry;
pub mod error;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[cfg(any(test, feature = "dynamic-store"))]
mod dynamic;

#[cfg(any(test, feature = "dynamic-store"))]
#[doc(inline)]
pub use dynamic::{DynamicStore, DynamicStoreExt};
#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::{CacheKey, CacheStore};
