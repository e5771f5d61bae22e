// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{sync::Arc, time::Duration};

use tracing::Level;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::metrics::Instruments;
use crate::{
    CacheName,
    telemetry::{CacheActivity, CacheOperation},
};

/// Where recorded events go.
#[derive(Debug, Default)]
pub(crate) struct Sinks {
    pub(crate) logs: bool,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) instruments: Option<Instruments>,
}

/// Records cache events as logs and metrics.
///
/// Cloning is cheap; all clones share the same instruments. The default value records nothing.
#[derive(Clone, Debug, Default)]
pub(crate) struct CacheTelemetry {
    sinks: Arc<Sinks>,
}

impl CacheTelemetry {
    pub(crate) fn new(sinks: Sinks) -> Self {
        Self { sinks: Arc::new(sinks) }
    }

    /// Records one store call or computation against `cache`.
    pub(crate) fn record(&self, cache: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.sinks.instruments {
            instruments.record(cache, operation, activity, duration);
        }

        if self.sinks.logs {
            emit(cache, operation, activity, duration);
        }
    }

    /// Records how many entries `cache` holds.
    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(unused_variables, reason = "no-op without the metrics feature")
    )]
    pub(crate) fn record_size(&self, cache: CacheName, size: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.sinks.instruments {
            instruments.record_size(cache, size);
        }
    }
}

fn emit(cache: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
    let operation = operation.as_str();
    let outcome = activity.as_str();
    let duration_ns = duration.map(|d| d.as_nanos());

    // tracing needs the level at compile time.
    macro_rules! event_at {
        ($level:ident) => {
            tracing::$level!(
                cache.name = cache,
                cache.operation = operation,
                cache.activity = outcome,
                cache.duration_ns = ?duration_ns,
                "cache.event"
            )
        };
    }

    let level = activity.level();
    if level == Level::ERROR {
        event_at!(error);
    } else if level == Level::INFO {
        event_at!(info);
    } else {
        event_at!(debug);
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::KeyValue;

    use super::*;
    use crate::telemetry::{
        config::TelemetryConfig,
        metrics::{CACHE_ACTIVITY, CACHE_NAME, CACHE_OPERATION},
        testing::{LogCapture, MetricTester},
    };

    #[test]
    fn metrics_carry_name_operation_and_activity() {
        let tester = MetricTester::new();
        let telemetry = TelemetryConfig::new().with_metrics(tester.meter_provider()).build();

        telemetry.record("orders", CacheOperation::ReadMany, CacheActivity::PartialHit, Some(Duration::from_millis(5)));

        tester.assert_attributes_contain(&[
            KeyValue::new(CACHE_NAME, "orders"),
            KeyValue::new(CACHE_OPERATION, "cache.read_many"),
            KeyValue::new(CACHE_ACTIVITY, "cache.partial_hit"),
        ]);
        let names = tester.collect_names();
        assert!(names.iter().any(|n| n == "cache.event.count"));
        assert!(names.iter().any(|n| n == "cache.operation.duration_ns"));
    }

    #[test]
    fn size_is_recorded_per_store() {
        let tester = MetricTester::new();
        let telemetry = TelemetryConfig::new().with_metrics(tester.meter_provider()).build();

        telemetry.record_size("sessions", 42);

        tester.assert_attributes_contain(&[KeyValue::new(CACHE_NAME, "sessions")]);
        assert!(tester.collect_names().iter().any(|n| n == "cache.size"));
    }

    #[test]
    fn log_event_has_every_field() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        emit("profiles", CacheOperation::Remove, CacheActivity::Error, Some(Duration::from_nanos(12345)));

        for expected in [
            "cache.event",
            "cache.name",
            "cache.operation",
            "cache.activity",
            "cache.duration_ns",
            "profiles",
            "cache.remove",
            "cache.error",
            "12345",
        ] {
            capture.assert_contains(expected);
        }
    }

    #[test]
    fn log_level_follows_activity() {
        for (activity, level) in [
            (CacheActivity::Error, "ERROR"),
            (CacheActivity::SentinelWritten, "INFO"),
            (CacheActivity::SentinelHit, "DEBUG"),
            (CacheActivity::Bypass, "DEBUG"),
        ] {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());
            emit("cache", CacheOperation::Write, activity, None);
            capture.assert_contains(level);
        }
    }

    #[test]
    fn default_telemetry_is_silent() {
        let telemetry = CacheTelemetry::default();

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record("cache", CacheOperation::Read, CacheActivity::Hit, Some(Duration::from_secs(1)));
        telemetry.record_size("cache", 3);

        assert!(capture.output().is_empty());
    }

    #[test]
    fn logs_without_metrics() {
        let telemetry = TelemetryConfig::new().with_logs().build();

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record("orders", CacheOperation::Clear, CacheActivity::Cleared, None);
        capture.assert_contains("orders");
        capture.assert_contains("cache.cleared");
    }
}
