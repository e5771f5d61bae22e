// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A borrowed view of a named store that records telemetry for every call.

use std::{collections::HashMap, time::Duration};

use bulkcache_store::{CacheStore, DynamicStore};
use tick::Clock;

use crate::{
    CacheKey, CacheName, Error, Stored,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, Stopwatch},
};

/// Runs store calls against one namespace, timing each call and recording its outcome.
///
/// Backend errors are recorded as [`CacheActivity::Error`] and returned as
/// [`ErrorKind::Backend`](crate::ErrorKind::Backend).
pub(crate) struct TracedStore<'a, V> {
    name: CacheName,
    store: &'a DynamicStore<Stored<V>>,
    telemetry: &'a CacheTelemetry,
    clock: &'a Clock,
}

impl<'a, V> TracedStore<'a, V> {
    pub(crate) fn new(name: CacheName, store: &'a DynamicStore<Stored<V>>, telemetry: &'a CacheTelemetry, clock: &'a Clock) -> Self {
        Self {
            name,
            store,
            telemetry,
            clock,
        }
    }

    fn finish<T>(
        &self,
        operation: CacheOperation,
        watch: &Stopwatch<'_>,
        result: Result<T, bulkcache_store::Error>,
        activity: impl FnOnce(&T) -> CacheActivity,
    ) -> Result<T, Error> {
        let elapsed = Some(watch.elapsed());
        match result {
            Ok(value) => {
                self.telemetry.record(self.name, operation, activity(&value), elapsed);
                Ok(value)
            }
            Err(e) => {
                self.telemetry.record(self.name, operation, CacheActivity::Error, elapsed);
                Err(e.into())
            }
        }
    }
}

impl<V> TracedStore<'_, V>
where
    V: Send + Sync,
{
    fn record_size(&self) {
        if let Some(size) = self.store.len() {
            self.telemetry.record_size(self.name, size);
        }
    }

    pub(crate) async fn read(&self, key: &CacheKey) -> Result<Option<Stored<V>>, Error> {
        let watch = Stopwatch::start(self.clock);
        let result = self.store.read(key).await;
        self.finish(CacheOperation::Read, &watch, result, |value| match value {
            Some(Stored::Value(_)) => CacheActivity::Hit,
            Some(Stored::Sentinel) => CacheActivity::SentinelHit,
            None => CacheActivity::Miss,
        })
    }

    pub(crate) async fn contains_key(&self, key: &CacheKey) -> Result<bool, Error> {
        let watch = Stopwatch::start(self.clock);
        let result = self.store.contains_key(key).await;
        self.finish(CacheOperation::ContainsKey, &watch, result, |found| {
            if *found { CacheActivity::Hit } else { CacheActivity::Miss }
        })
    }

    pub(crate) async fn read_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, Stored<V>>, Error> {
        let watch = Stopwatch::start(self.clock);
        let result = self.store.read_many(keys).await;
        self.finish(CacheOperation::ReadMany, &watch, result, |found| match found.len() {
            0 => CacheActivity::Miss,
            n if n >= keys.len() => CacheActivity::Hit,
            _ => CacheActivity::PartialHit,
        })
    }

    pub(crate) async fn write(&self, key: &CacheKey, value: Stored<V>, ttl: Duration) -> Result<(), Error> {
        let activity = if value.is_sentinel() {
            CacheActivity::SentinelWritten
        } else {
            CacheActivity::Written
        };
        let watch = Stopwatch::start(self.clock);
        let result = self.store.write(key, value, ttl).await;
        let result = self.finish(CacheOperation::Write, &watch, result, |()| activity);
        if result.is_ok() {
            self.record_size();
        }
        result
    }

    /// Writes all entries with one TTL. Does nothing for an empty batch.
    pub(crate) async fn write_many(&self, entries: HashMap<CacheKey, Stored<V>>, ttl: Duration) -> Result<(), Error> {
        if entries.is_empty() {
            return Ok(());
        }
        let activity = if entries.values().all(Stored::is_sentinel) {
            CacheActivity::SentinelWritten
        } else {
            CacheActivity::Written
        };
        let watch = Stopwatch::start(self.clock);
        let result = self.store.write_many(entries, ttl).await;
        let result = self.finish(CacheOperation::WriteMany, &watch, result, |()| activity);
        if result.is_ok() {
            self.record_size();
        }
        result
    }

    pub(crate) async fn remove(&self, keys: &[CacheKey]) -> Result<(), Error> {
        let watch = Stopwatch::start(self.clock);
        let result = self.store.remove(keys).await;
        let result = self.finish(CacheOperation::Remove, &watch, result, |()| CacheActivity::Removed);
        if result.is_ok() {
            self.record_size();
        }
        result
    }

    pub(crate) async fn clear(&self) -> Result<(), Error> {
        let watch = Stopwatch::start(self.clock);
        let result = self.store.clear().await;
        let result = self.finish(CacheOperation::Clear, &watch, result, |()| CacheActivity::Cleared);
        if result.is_ok() {
            self.record_size();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use bulkcache_store::{
        DynamicStoreExt,
        testing::{MockStore, StoreOp},
    };

    use super::*;
    use crate::{
        ErrorKind,
        telemetry::{config::TelemetryConfig, testing::LogCapture},
    };

    fn fixture() -> (MockStore<Stored<i32>>, DynamicStore<Stored<i32>>, CacheTelemetry, Clock) {
        let mock = MockStore::new();
        let dynamic = mock.clone().into_dynamic();
        (mock, dynamic, TelemetryConfig::new().with_logs().build(), Clock::new_frozen())
    }

    #[test]
    fn read_records_hit_sentinel_and_miss() {
        let (mock, dynamic, telemetry, clock) = fixture();
        let traced = TracedStore::new("users", &dynamic, &telemetry, &clock);
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        futures::executor::block_on(async {
            traced
                .write(&"a".to_string(), Stored::Value(1), Duration::from_secs(1))
                .await
                .expect("write should succeed");
            traced
                .write(&"b".to_string(), Stored::Sentinel, Duration::from_secs(1))
                .await
                .expect("write should succeed");

            assert_eq!(traced.read(&"a".to_string()).await.expect("read"), Some(Stored::Value(1)));
            assert_eq!(traced.read(&"b".to_string()).await.expect("read"), Some(Stored::Sentinel));
            assert_eq!(traced.read(&"c".to_string()).await.expect("read"), None);
        });

        assert_eq!(mock.entry_count(), 2);
        capture.assert_contains("cache.written");
        capture.assert_contains("cache.sentinel_written");
        capture.assert_contains("cache.hit");
        capture.assert_contains("cache.sentinel_hit");
        capture.assert_contains("cache.miss");
        capture.assert_contains("users");
    }

    #[test]
    fn read_many_classifies_partial_hits() {
        let (_mock, dynamic, telemetry, clock) = fixture();
        let traced = TracedStore::new("items", &dynamic, &telemetry, &clock);
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        futures::executor::block_on(async {
            traced
                .write(&"a".to_string(), Stored::Value(1), Duration::from_secs(1))
                .await
                .expect("write should succeed");
            let found = traced
                .read_many(&["a".to_string(), "b".to_string()])
                .await
                .expect("read_many should succeed");
            assert_eq!(found.len(), 1);
        });

        capture.assert_contains("cache.partial_hit");
    }

    #[test]
    fn empty_write_many_skips_the_store() {
        let (mock, dynamic, telemetry, clock) = fixture();
        let traced = TracedStore::new("items", &dynamic, &telemetry, &clock);

        futures::executor::block_on(traced.write_many(HashMap::new(), Duration::from_secs(1))).expect("empty batch is a no-op");

        assert!(mock.operations().is_empty());
    }

    #[test]
    fn backend_errors_are_recorded_and_returned() {
        let (mock, dynamic, telemetry, clock) = fixture();
        mock.fail_when(|op| matches!(op, StoreOp::Remove(_)));
        let traced = TracedStore::new("items", &dynamic, &telemetry, &clock);
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let err = futures::executor::block_on(traced.remove(&["a".to_string()])).expect_err("remove should fail");

        assert_eq!(err.kind(), ErrorKind::Backend);
        capture.assert_contains("items");
        capture.assert_contains("cache.error");
        capture.assert_contains("ERROR");
    }
}
