// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Simple Example
//!
//! Demonstrates single-key read-through caching, penetration protection and invalidation.

use std::time::Duration;

use bulkcache::{CacheConfig, CacheOrchestrator, Error, SingleKey, Ttl};
use tick::Clock;

async fn load_user(id: u64) -> Result<Option<String>, Error> {
    println!("  loading user {id} from the database");
    Ok((id < 100).then(|| format!("user-{id}")))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let config = CacheConfig::builder(Clock::new_tokio())
        .memory("users")
        .prevent_penetration(true)
        .sentinel_ttl(Duration::from_secs(10))
        .logs()
        .build();
    let orchestrator = CacheOrchestrator::new(config);

    let op = SingleKey::new("users", |id: &u64| format!("user:{id}")).ttl(Ttl::from_millis(60_000));

    // First call misses and loads, the second is served from the cache.
    for _ in 0..2 {
        let user = orchestrator.read_or_compute(&op, &7, || load_user(7)).await?;
        println!("user 7: {user:?}");
    }

    // Unknown users are cached as absent.
    for _ in 0..2 {
        let user = orchestrator.read_or_compute(&op, &404, || load_user(404)).await?;
        println!("user 404: {user:?}");
    }

    // After invalidation the next call loads again.
    orchestrator.invalidate(&op, &7).await?;
    let user = orchestrator.read_or_compute(&op, &7, || load_user(7)).await?;
    println!("user 7 after invalidation: {user:?}");

    Ok(())
}
