// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Benchmarks for single-key and multi-key orchestrator paths.

#![allow(missing_docs, reason = "Benchmark code")]

use std::hint::black_box;

use bulkcache::{CacheConfig, CacheOrchestrator, Error, IdentityRule, MultiKey, SingleKey, Ttl};
use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use tick::Clock;

fn orchestrator(prevent_penetration: bool) -> CacheOrchestrator<u64> {
    CacheOrchestrator::new(
        CacheConfig::builder(Clock::new_frozen())
            .memory("bench")
            .prevent_penetration(prevent_penetration)
            .build(),
    )
}

fn multi_key() -> MultiKey<(), u64, u64> {
    MultiKey::new("bench", |_: &(), id: &u64| format!("k:{id}"))
        .identity(IdentityRule::new(|value: &u64| *value))
        .ttl(Ttl::FOREVER)
}

fn bench_single_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_key");
    let op = SingleKey::new("bench", |id: &u64| format!("k:{id}"));

    group.bench_function("hit", |b| {
        let orchestrator = orchestrator(false);
        block_on(orchestrator.read_or_compute(&op, &1, || async { Ok::<_, Error>(Some(1)) })).expect("warm up");

        b.iter(|| block_on(orchestrator.read_or_compute(&op, black_box(&1), || async { Ok::<_, Error>(Some(1)) })));
    });

    group.bench_function("bypass", |b| {
        let orchestrator = orchestrator(false);
        let op = SingleKey::new("bench", |id: &u64| format!("k:{id}")).ttl(Ttl::NO_CACHE);

        b.iter(|| block_on(orchestrator.read_or_compute(&op, black_box(&1), || async { Ok::<_, Error>(Some(1)) })));
    });

    group.finish();
}

fn bench_multi_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_key");
    let op = multi_key();
    let ids: Vec<u64> = (0..100).collect();

    group.bench_function("all_hits_100", |b| {
        let orchestrator = orchestrator(false);
        let _: Vec<u64> = block_on(orchestrator.read_or_compute_many(&op, &(), &ids, |ids| async move { Ok::<_, Error>(ids) })).expect("warm up");

        b.iter(|| {
            let values: Vec<u64> =
                block_on(orchestrator.read_or_compute_many(&op, &(), black_box(&ids), |ids| async move { Ok::<_, Error>(ids) })).expect("hit");
            values
        });
    });

    group.bench_function("half_hits_100", |b| {
        let orchestrator = orchestrator(false);
        let even: Vec<u64> = ids.iter().copied().filter(|id| id % 2 == 0).collect();
        let _: Vec<u64> = block_on(orchestrator.read_or_compute_many(&op, &(), &even, |ids| async move { Ok::<_, Error>(ids) })).expect("warm up");

        // The source returns nothing, so odd identities miss on every iteration.
        b.iter(|| {
            let values: Vec<u64> =
                block_on(orchestrator.read_or_compute_many(&op, &(), black_box(&ids), |_| async { Ok::<_, Error>(Vec::new()) })).expect("partial hit");
            values
        });
    });

    group.bench_function("array_sentinels_100", |b| {
        let orchestrator = orchestrator(true);
        let _: Vec<u64> = block_on(orchestrator.read_or_compute_many(&op, &(), &ids, |_| async { Ok::<_, Error>(Vec::new()) })).expect("warm up");

        b.iter(|| {
            let values: Box<[Option<u64>]> = block_on(orchestrator.read_or_compute_many(&op, &(), black_box(&ids), |_| async {
                Ok::<Box<[Option<u64>]>, Error>(Box::default())
            }))
            .expect("sentinel hit");
            values
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_key, bench_multi_key);
criterion_main!(benches);
