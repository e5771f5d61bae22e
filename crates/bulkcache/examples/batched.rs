// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Batched Example
//!
//! Demonstrates multi-key lookups with partial hits, in several result shapes.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use bulkcache::{CacheConfig, CacheOrchestrator, Error, HitRateCounter, IdentityRule, MultiKey, Ttl};
use tick::Clock;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Price {
    sku: u32,
    cents: u64,
}

fn price(sku: u32) -> Option<Price> {
    (sku % 10 != 0).then(|| Price {
        sku,
        cents: u64::from(sku) * 100,
    })
}

async fn load_prices<C: FromIterator<Price>>(skus: Vec<u32>) -> Result<C, Error> {
    println!("  loading prices for {skus:?}");
    Ok(skus.into_iter().filter_map(price).collect())
}

async fn load_price_map<C: FromIterator<(u32, Price)>>(skus: Vec<u32>) -> Result<C, Error> {
    println!("  loading price map for {skus:?}");
    Ok(skus.into_iter().filter_map(|sku| price(sku).map(|p| (sku, p))).collect())
}

/// Array results are matched back by SKU, so only the filled slots matter.
async fn load_price_array<const N: usize>(skus: Vec<u32>) -> Result<[Option<Price>; N], Error> {
    println!("  loading price array for {skus:?}");
    let mut out = std::array::from_fn(|_| None);
    for (slot, sku) in skus.into_iter().enumerate().take(N) {
        out[slot] = price(sku);
    }
    Ok(out)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let hits = Arc::new(HitRateCounter::new());
    let config = CacheConfig::builder(Clock::new_tokio())
        .memory("prices")
        .prevent_penetration(true)
        .hit_collector(Arc::clone(&hits))
        .build();
    let orchestrator = CacheOrchestrator::new(config);

    let op: MultiKey<&'static str, u32, Price> = MultiKey::new("prices", |currency: &&'static str, sku: &u32| format!("{currency}:{sku}"))
        .identity(IdentityRule::new(|price: &Price| price.sku))
        .ttl(Ttl::from_millis(300_000));

    // Warm up two SKUs.
    let warm: Vec<Price> = orchestrator.read_or_compute_many(&op, &"eur", &[1, 2], load_prices).await?;
    println!("warm: {warm:?}");

    // Only 3 and 10 reach the loader; 10 has no price and is remembered as absent.
    let ordered: [Option<Price>; 4] = orchestrator
        .read_or_compute_many(&op, &"eur", &[3, 1, 10, 2], load_price_array)
        .await?;
    println!("array: {ordered:?}");

    // Everything is cached now, in any shape.
    let set: HashSet<Price> = orchestrator
        .read_or_compute_many(&op, &"eur", &[1, 2, 3], load_prices)
        .await?;
    println!("set: {} prices", set.len());

    let by_sku: BTreeMap<u32, Price> = orchestrator
        .read_or_compute_many(&op, &"eur", &[2, 3, 10], load_price_map)
        .await?;
    println!("map: {by_sku:?}");

    println!(
        "hits: {}, misses: {}, hit rate: {:.2}",
        hits.hits("prices"),
        hits.misses("prices"),
        hits.hit_rate("prices").unwrap_or_default()
    );

    Ok(())
}
