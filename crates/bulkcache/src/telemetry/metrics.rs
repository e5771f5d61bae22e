// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `OpenTelemetry` instruments for store calls and data source computations.

use std::time::Duration;

use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Gauge, Histogram, MeterProvider},
};

use crate::{
    CacheName,
    telemetry::{CacheActivity, CacheOperation},
};

pub(crate) const CACHE_NAME: &str = "cache.name";
pub(crate) const CACHE_OPERATION: &str = "cache.operation";
pub(crate) const CACHE_ACTIVITY: &str = "cache.activity";

const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";

/// The three instruments every configuration with metrics records into.
#[derive(Clone, Debug)]
pub(crate) struct Instruments {
    events: Counter<u64>,
    durations: Histogram<f64>,
    size: Gauge<u64>,
}

impl Instruments {
    pub(crate) fn new(provider: &dyn MeterProvider) -> Self {
        let meter = provider.meter_with_scope(
            InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
                .with_version(env!("CARGO_PKG_VERSION"))
                .with_schema_url(SCHEMA_URL)
                .build(),
        );

        Self {
            events: meter
                .u64_counter("cache.event.count")
                .with_description("Store calls and computations by outcome")
                .with_unit("{event}")
                .build(),
            durations: meter
                .f64_histogram("cache.operation.duration_ns")
                .with_description("Duration of store calls and computations")
                .with_unit("ns")
                .build(),
            size: meter
                .u64_gauge("cache.size")
                .with_description("Entries held by a store after a mutation")
                .with_unit("{entry}")
                .build(),
        }
    }

    pub(crate) fn record(&self, cache: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        let attrs = [
            KeyValue::new(CACHE_NAME, cache),
            KeyValue::new(CACHE_OPERATION, operation.as_str()),
            KeyValue::new(CACHE_ACTIVITY, activity.as_str()),
        ];

        self.events.add(1, &attrs);
        if let Some(duration) = duration {
            self.durations.record(duration.as_secs_f64() * 1e9, &attrs);
        }
    }

    pub(crate) fn record_size(&self, cache: CacheName, size: u64) {
        self.size.record(size, &[KeyValue::new(CACHE_NAME, cache)]);
    }
}
