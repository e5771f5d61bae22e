// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A batched caching engine for single-key and multi-key data fetches.
//!
//! This crate turns an arbitrary data-fetch operation into a cache-first operation:
//! - Read-through population of named, pluggable [`CacheStore`] backends
//! - Multi-key lookups that call the data source only for the keys that missed
//! - Results rebuilt in the caller's shape: arrays, ordered lists, sets or maps
//! - Cache penetration protection through the [`Stored::Sentinel`] placeholder
//! - Per-operation gates and TTLs, hit-rate collection, `tracing` logs and OpenTelemetry metrics
//!
//! Operations are described by [`SingleKey`] and [`MultiKey`] values and run through a
//! [`CacheOrchestrator`] built from a [`CacheConfig`].
//!
//! # Examples
//!
//! ## Single Key
//!
//! ```
//! use bulkcache::{CacheConfig, CacheOrchestrator, Error, SingleKey, Ttl};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let config = CacheConfig::builder(Clock::new_frozen())
//!     .memory("prices")
//!     .prevent_penetration(true)
//!     .build();
//! let orchestrator = CacheOrchestrator::new(config);
//!
//! let op = SingleKey::new("prices", |sku: &u32| format!("price:{sku}")).ttl(Ttl::from_millis(30_000));
//!
//! let price = orchestrator
//!     .read_or_compute(&op, &1, || async { Ok::<_, Error>(Some(1_999_u64)) })
//!     .await?;
//! assert_eq!(price, Some(1_999));
//!
//! // Unknown SKUs are remembered as absent and not looked up again.
//! let price = orchestrator
//!     .read_or_compute(&op, &404, || async { Ok::<_, Error>(None) })
//!     .await?;
//! assert_eq!(price, None);
//! # Ok::<(), Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Multiple Keys
//!
//! ```
//! use bulkcache::{CacheConfig, CacheOrchestrator, Error, MultiKey};
//! use std::collections::BTreeMap;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let orchestrator = CacheOrchestrator::new(CacheConfig::builder(Clock::new_frozen()).memory("stock").build());
//! let op = MultiKey::new("stock", |warehouse: &u16, sku: &u32| format!("{warehouse}:{sku}"));
//!
//! let stock: BTreeMap<u32, u64> = orchestrator
//!     .read_or_compute_many(&op, &7, &[1, 2], |skus| async move {
//!         Ok::<_, Error>(skus.into_iter().map(|sku| (sku, u64::from(sku) * 10)).collect())
//!     })
//!     .await?;
//! assert_eq!(stock, BTreeMap::from([(1, 10), (2, 20)]));
//! # Ok::<(), Error>(())
//! # }).unwrap();
//! ```

mod assemble;
mod config;
mod error;
mod evaluator;
mod fail_open;
mod hits;
mod merge;
mod op;
mod orchestrator;
mod sentinel;
mod telemetry;
mod tiered;
mod traced;

/// The name of a registered store.
pub type CacheName = &'static str;

#[doc(inline)]
pub use assemble::{Computed, Container, Layout, ResultAssembler};
#[doc(inline)]
pub use bulkcache_store::{CacheEntry, CacheKey, CacheStore, DynamicStore, DynamicStoreExt, Error as StoreError};
#[cfg(feature = "memory")]
#[doc(inline)]
pub use bulkcache_memory::{InMemoryStore, InMemoryStoreBuilder};
#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use bulkcache_store::testing::{MockStore, StoreOp};
#[doc(inline)]
pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_SENTINEL_TTL};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use evaluator::{ExpressionEvaluator, JsonPointerEvaluator};
#[doc(inline)]
pub use fail_open::FailOpenStore;
#[doc(inline)]
pub use hits::{HitCollector, HitRateCounter};
#[doc(inline)]
pub use merge::KeyValueMerger;
#[doc(inline)]
pub use op::{Gate, IdentityRule, MultiKey, SingleKey, Ttl};
#[doc(inline)]
pub use orchestrator::CacheOrchestrator;
#[doc(inline)]
pub use sentinel::Stored;
#[doc(inline)]
pub use tiered::{PromotionPolicy, TieredStore};
