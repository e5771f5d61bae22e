// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `OpenTelemetry` metrics emitted by the orchestrator.

use bulkcache::{CacheConfig, CacheOrchestrator, Error, SingleKey, Ttl};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::metrics::{
    InMemoryMetricExporter, SdkMeterProvider,
    data::{AggregatedMetrics, MetricData, ResourceMetrics, ScopeMetrics},
};
use tick::Clock;

struct Exported {
    names: Vec<String>,
    attributes: Vec<KeyValue>,
}

fn export(provider: &SdkMeterProvider, exporter: &InMemoryMetricExporter) -> Exported {
    provider.force_flush().expect("flush should succeed");
    let resources = exporter.get_finished_metrics().expect("metrics should be exported");
    let metrics: Vec<_> = resources
        .iter()
        .flat_map(ResourceMetrics::scope_metrics)
        .flat_map(ScopeMetrics::metrics)
        .collect();

    let names = metrics.iter().map(|m| m.name().to_string()).collect();
    let attributes: Vec<KeyValue> = metrics
        .iter()
        .flat_map(|m| -> Vec<KeyValue> {
            match m.data() {
                AggregatedMetrics::U64(MetricData::Sum(sum)) => sum.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                AggregatedMetrics::F64(MetricData::Histogram(hist)) => hist.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                AggregatedMetrics::U64(MetricData::Gauge(gauge)) => gauge.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                _ => Vec::new(),
            }
        })
        .collect();

    Exported { names, attributes }
}

fn setup() -> (CacheOrchestrator<String>, SdkMeterProvider, InMemoryMetricExporter) {
    let exporter = InMemoryMetricExporter::default();
    let provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();
    let config = CacheConfig::builder(Clock::new_frozen())
        .memory("profiles")
        .prevent_penetration(true)
        .metrics(&provider)
        .build();
    (CacheOrchestrator::new(config), provider, exporter)
}

#[test]
fn read_through_records_counters_durations_and_size() {
    let (orchestrator, provider, exporter) = setup();
    let op = SingleKey::new("profiles", |id: &u32| format!("p:{id}")).ttl(Ttl::from_millis(1_000));

    futures::executor::block_on(async {
        orchestrator
            .read_or_compute(&op, &1, || async { Ok::<_, Error>(Some("ada".to_string())) })
            .await
            .expect("first call should succeed");
        orchestrator
            .read_or_compute(&op, &1, || async { Ok::<_, Error>(Some("grace".to_string())) })
            .await
            .expect("second call should succeed");
    });

    let exported = export(&provider, &exporter);
    for name in ["cache.event.count", "cache.operation.duration_ns", "cache.size"] {
        assert!(exported.names.iter().any(|n| n == name), "missing instrument {name}: {:?}", exported.names);
    }

    for expected in [
        KeyValue::new("cache.name", "profiles"),
        KeyValue::new("cache.activity", "cache.miss"),
        KeyValue::new("cache.activity", "cache.computed"),
        KeyValue::new("cache.activity", "cache.written"),
        KeyValue::new("cache.activity", "cache.hit"),
        KeyValue::new("cache.operation", "cache.contains_key"),
    ] {
        assert!(
            exported.attributes.contains(&expected),
            "attribute {expected:?} not found in {:?}",
            exported.attributes
        );
    }
}

#[test]
fn sentinel_writes_are_distinguished() {
    let (orchestrator, provider, exporter) = setup();
    let op = SingleKey::new("profiles", |id: &u32| format!("p:{id}"));

    futures::executor::block_on(async {
        for _ in 0..2 {
            let value = orchestrator
                .read_or_compute(&op, &404, || async { Ok::<_, Error>(None) })
                .await
                .expect("call should succeed");
            assert!(value.is_none());
        }
    });

    let activities: Vec<Value> = export(&provider, &exporter)
        .attributes
        .into_iter()
        .filter(|kv| kv.key.as_str() == "cache.activity")
        .map(|kv| kv.value)
        .collect();

    assert!(activities.contains(&Value::from("cache.sentinel_written")));
    assert!(activities.contains(&Value::from("cache.sentinel_hit")));
}
