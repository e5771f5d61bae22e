// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory cache store backed by moka.
//!
//! This crate provides [`InMemoryStore`], a concurrent [`CacheStore`](bulkcache_store::CacheStore)
//! using moka's `TinyLFU` eviction. Each entry expires after the TTL it was written with; the
//! store stamps writes and checks expiry against a [`tick::Clock`], so tests can advance time
//! deterministically. Use [`InMemoryStoreBuilder`] to configure capacity without exposing moka
//! types directly.
//!
//! # Quick Start
//!
//! ```
//! use bulkcache_memory::InMemoryStore;
//! use bulkcache_store::CacheStore;
//! use std::time::Duration;
//! use tick::Clock;
//!
//! # futures::executor::block_on(async {
//! let store = InMemoryStore::<i32>::builder(Clock::new_frozen())
//!     .max_capacity(1000)
//!     .build();
//!
//! store.write(&"key".to_string(), 42, Duration::from_secs(300)).await.unwrap();
//! assert_eq!(store.read(&"key".to_string()).await.unwrap(), Some(42));
//! # });
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::InMemoryStoreBuilder;
#[doc(inline)]
pub use store::InMemoryStore;
