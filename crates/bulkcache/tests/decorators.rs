// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for store decorators running under the orchestrator.

use std::time::Duration;

use bulkcache::{
    CacheConfig, CacheOrchestrator, CacheStore, Error, FailOpenStore, IdentityRule, InMemoryStore, MockStore, MultiKey, PromotionPolicy,
    SingleKey, StoreOp, Stored, TieredStore, Ttl,
};
use tick::Clock;

type TestResult = Result<(), Error>;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn op() -> SingleKey<u32> {
    SingleKey::new("docs", |id: &u32| format!("doc:{id}")).ttl(Ttl::from_millis(5_000))
}

#[test]
fn fail_open_turns_an_unavailable_backend_into_misses() -> TestResult {
    block_on(async {
        let backend = MockStore::<Stored<String>>::new();
        backend.fail_when(|_| true);

        let orchestrator = CacheOrchestrator::new(
            CacheConfig::builder(Clock::new_frozen())
                .store("docs", FailOpenStore::new(backend.clone()))
                .build(),
        );

        let mut calls = 0;
        for _ in 0..2 {
            let doc = orchestrator
                .read_or_compute(&op(), &1, || {
                    calls += 1;
                    async { Ok::<_, Error>(Some("body".to_string())) }
                })
                .await?;
            assert_eq!(doc.as_deref(), Some("body"));
        }

        // Every call reaches the source since nothing could be cached.
        assert_eq!(calls, 2);
        assert!(backend.operations().iter().any(StoreOp::is_write));
        assert_eq!(backend.entry_count(), 0);
        Ok(())
    })
}

#[test]
fn without_fail_open_the_same_outage_is_an_error() {
    block_on(async {
        let backend = MockStore::<Stored<String>>::new();
        backend.fail_when(|_| true);

        let orchestrator = CacheOrchestrator::new(CacheConfig::builder(Clock::new_frozen()).store("docs", backend).build());

        let result = orchestrator
            .read_or_compute(&op(), &1, || async { Ok::<_, Error>(Some("body".to_string())) })
            .await;

        assert!(result.is_err());
    });
}

#[test]
fn fail_open_recovers_once_the_backend_does() -> TestResult {
    block_on(async {
        let backend = MockStore::<Stored<String>>::new();
        backend.fail_when(|op| op.is_write());

        let orchestrator = CacheOrchestrator::new(
            CacheConfig::builder(Clock::new_frozen())
                .store("docs", FailOpenStore::new(backend.clone()))
                .build(),
        );

        let _ = orchestrator
            .read_or_compute(&op(), &1, || async { Ok::<_, Error>(Some("v1".to_string())) })
            .await?;
        assert!(!backend.contains(&"doc:1".to_string()));

        backend.clear_failures();
        let _ = orchestrator
            .read_or_compute(&op(), &1, || async { Ok::<_, Error>(Some("v2".to_string())) })
            .await?;

        let cached = orchestrator
            .read_or_compute(&op(), &1, || async { Ok::<_, Error>(Some("v3".to_string())) })
            .await?;
        assert_eq!(cached.as_deref(), Some("v2"));
        Ok(())
    })
}

#[test]
fn tiered_store_serves_and_promotes_far_hits() -> TestResult {
    block_on(async {
        let clock = Clock::new_frozen();
        let near = InMemoryStore::<Stored<String>>::new(clock.clone());
        let far = MockStore::<Stored<String>>::new();
        far.write(&"doc:1".to_string(), Stored::Value("far".to_string()), Duration::from_secs(60))
            .await?;

        let orchestrator = CacheOrchestrator::new(
            CacheConfig::builder(clock)
                .store("docs", TieredStore::new(near.clone(), far.clone(), Duration::from_secs(10)))
                .build(),
        );

        let doc = orchestrator
            .read_or_compute(&op(), &1, || async { Ok::<_, Error>(Some("source".to_string())) })
            .await?;

        assert_eq!(doc.as_deref(), Some("far"));
        assert_eq!(near.read(&"doc:1".to_string()).await?, Some(Stored::Value("far".to_string())));
        Ok(())
    })
}

#[test]
fn tiered_store_writes_reach_both_tiers() -> TestResult {
    block_on(async {
        let clock = Clock::new_frozen();
        let near = MockStore::<Stored<u32>>::new();
        let far = MockStore::<Stored<u32>>::new();
        let orchestrator = CacheOrchestrator::new(
            CacheConfig::builder(clock)
                .store("squares", TieredStore::new(near.clone(), far.clone(), Duration::from_secs(10)))
                .prevent_penetration(true)
                .build(),
        );
        let op = MultiKey::new("squares", |_: &(), n: &u32| format!("sq:{n}")).identity(IdentityRule::new(|v: &u32| v.isqrt()));

        let squares: Vec<u32> = orchestrator
            .read_or_compute_many(&op, &(), &[2, 3, 0], |ids| async move {
                Ok::<_, Error>(ids.into_iter().filter(|n| *n > 0).map(|n| n * n).collect())
            })
            .await?;

        assert_eq!(squares, [4, 9]);
        for store in [&near, &far] {
            assert_eq!(store.peek(&"sq:2".to_string()), Some(Stored::Value(4)));
            assert_eq!(store.peek(&"sq:0".to_string()), Some(Stored::Sentinel));
        }

        orchestrator.invalidate_many(&op, &(), &[2]).await?;
        assert!(!near.contains(&"sq:2".to_string()));
        assert!(!far.contains(&"sq:2".to_string()));
        Ok(())
    })
}

#[test]
fn promotion_policy_keeps_sentinels_out_of_the_near_tier() -> TestResult {
    block_on(async {
        let near = MockStore::<Stored<String>>::new();
        let far = MockStore::with_data(
            [
                ("doc:1".to_string(), Stored::Value("one".to_string())),
                ("doc:2".to_string(), Stored::Sentinel),
            ]
            .into(),
        );
        let tiered = TieredStore::new(near.clone(), far, Duration::from_secs(10))
            .promotion_policy(PromotionPolicy::when(|stored: &Stored<String>| !stored.is_sentinel()));

        let found = tiered.read_many(&["doc:1".to_string(), "doc:2".to_string()]).await?;

        assert_eq!(found.len(), 2);
        assert!(near.contains(&"doc:1".to_string()));
        assert!(!near.contains(&"doc:2".to_string()));
        Ok(())
    })
}
