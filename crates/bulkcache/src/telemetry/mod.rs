// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry: structured logs through `tracing` and, with the `metrics` feature,
//! OpenTelemetry metrics.
//!
//! Both are off until enabled on the configuration builder with
//! [`logs()`](crate::CacheConfigBuilder::logs) and `metrics()`.

use tracing::Level;

mod cache;
pub(crate) mod config;
#[cfg(any(feature = "metrics", test))]
mod metrics;
#[cfg(test)]
pub(crate) mod testing;
mod timing;

pub(crate) use cache::CacheTelemetry;
pub(crate) use timing::Stopwatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Read,
    ReadMany,
    Write,
    WriteMany,
    ContainsKey,
    Remove,
    Clear,
    Compute,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "cache.read",
            Self::ReadMany => "cache.read_many",
            Self::Write => "cache.write",
            Self::WriteMany => "cache.write_many",
            Self::ContainsKey => "cache.contains_key",
            Self::Remove => "cache.remove",
            Self::Clear => "cache.clear",
            Self::Compute => "cache.compute",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    PartialHit,
    SentinelHit,
    Miss,
    Written,
    SentinelWritten,
    Removed,
    Cleared,
    Computed,
    Bypass,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::PartialHit => "cache.partial_hit",
            Self::SentinelHit => "cache.sentinel_hit",
            Self::Miss => "cache.miss",
            Self::Written => "cache.written",
            Self::SentinelWritten => "cache.sentinel_written",
            Self::Removed => "cache.removed",
            Self::Cleared => "cache.cleared",
            Self::Computed => "cache.computed",
            Self::Bypass => "cache.bypass",
            Self::Error => "cache.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::PartialHit | Self::SentinelHit | Self::Miss | Self::Computed | Self::Bypass => Level::DEBUG,
            Self::Written | Self::SentinelWritten | Self::Removed | Self::Cleared => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_operation_as_str() {
        assert_eq!(CacheOperation::Read.as_str(), "cache.read");
        assert_eq!(CacheOperation::ReadMany.as_str(), "cache.read_many");
        assert_eq!(CacheOperation::Write.as_str(), "cache.write");
        assert_eq!(CacheOperation::WriteMany.as_str(), "cache.write_many");
        assert_eq!(CacheOperation::ContainsKey.as_str(), "cache.contains_key");
        assert_eq!(CacheOperation::Remove.as_str(), "cache.remove");
        assert_eq!(CacheOperation::Clear.as_str(), "cache.clear");
        assert_eq!(CacheOperation::Compute.as_str(), "cache.compute");
    }

    #[test]
    fn cache_activity_as_str() {
        assert_eq!(CacheActivity::Hit.as_str(), "cache.hit");
        assert_eq!(CacheActivity::PartialHit.as_str(), "cache.partial_hit");
        assert_eq!(CacheActivity::SentinelHit.as_str(), "cache.sentinel_hit");
        assert_eq!(CacheActivity::Miss.as_str(), "cache.miss");
        assert_eq!(CacheActivity::Written.as_str(), "cache.written");
        assert_eq!(CacheActivity::SentinelWritten.as_str(), "cache.sentinel_written");
        assert_eq!(CacheActivity::Removed.as_str(), "cache.removed");
        assert_eq!(CacheActivity::Cleared.as_str(), "cache.cleared");
        assert_eq!(CacheActivity::Computed.as_str(), "cache.computed");
        assert_eq!(CacheActivity::Bypass.as_str(), "cache.bypass");
        assert_eq!(CacheActivity::Error.as_str(), "cache.error");
    }

    #[test]
    fn cache_activity_levels() {
        for activity in [
            CacheActivity::Hit,
            CacheActivity::PartialHit,
            CacheActivity::SentinelHit,
            CacheActivity::Miss,
            CacheActivity::Computed,
            CacheActivity::Bypass,
        ] {
            assert_eq!(activity.level(), Level::DEBUG, "{activity:?}");
        }
        for activity in [
            CacheActivity::Written,
            CacheActivity::SentinelWritten,
            CacheActivity::Removed,
            CacheActivity::Cleared,
        ] {
            assert_eq!(activity.level(), Level::INFO, "{activity:?}");
        }
        assert_eq!(CacheActivity::Error.level(), Level::ERROR);
    }
}
