// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tiered Example
//!
//! Demonstrates composing a small near tier with a larger far tier, and failing open.

use std::time::Duration;

use bulkcache::{CacheConfig, CacheOrchestrator, Error, FailOpenStore, InMemoryStore, PromotionPolicy, SingleKey, Stored, TieredStore};
use tick::Clock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let clock = Clock::new_tokio();

    let near = InMemoryStore::<Stored<String>>::builder(clock.clone())
        .max_capacity(100)
        .name("near")
        .build();
    let far = InMemoryStore::<Stored<String>>::builder(clock.clone()).name("far").build();

    // Sentinels stay in the far tier only.
    let store = TieredStore::new(near, far, Duration::from_secs(30))
        .promotion_policy(PromotionPolicy::when(|stored: &Stored<String>| !stored.is_sentinel()));

    let config = CacheConfig::<String>::builder(clock)
        .store("docs", FailOpenStore::new(store))
        .prevent_penetration(true)
        .build();
    let orchestrator = CacheOrchestrator::new(config);

    let op = SingleKey::new("docs", |path: &String| format!("doc:{path}"));

    let doc = orchestrator
        .read_or_compute(&op, &"readme".to_string(), || async { Ok::<_, Error>(Some("# hello".to_string())) })
        .await?;
    println!("readme: {doc:?}");

    let missing = orchestrator
        .read_or_compute(&op, &"missing".to_string(), || async { Ok::<_, Error>(None) })
        .await?;
    println!("missing: {missing:?}");

    Ok(())
}
