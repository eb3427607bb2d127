//! Typed cache access and single-winner computation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::store::{CacheError, ObjectCache};

/// Cheaply cloneable front to an [`ObjectCache`].
///
/// Adds JSON encoding, per-key async locks, and [`get_or_compute`],
/// the one mandatory concurrency primitive of the lookup core: at most
/// one in-flight computation per key within this process. Losers wait
/// for the winner and re-read the published value.
///
/// Backend failures on reads are logged and treated as misses (the
/// caller recomputes); failures on writes are logged and the computed
/// value is still returned.
///
/// [`get_or_compute`]: CacheHandle::get_or_compute
#[derive(Clone)]
pub struct CacheHandle {
    store: Arc<dyn ObjectCache>,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl CacheHandle {
    pub fn new(store: Arc<dyn ObjectCache>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch and decode a value. Decode failures (e.g. a stale entry
    /// written by an older format) are logged and treated as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get_raw(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Encode and store a value with the given TTL.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_raw(key, raw, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    /// Acquire the per-key regeneration lock.
    ///
    /// Holders are the single writer for that key until the guard
    /// drops. The lock map is swept of uncontended entries on each
    /// acquisition so it stays bounded by the number of keys currently
    /// being regenerated.
    pub async fn key_lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock map poisoned");
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Read-through computation with single-winner semantics.
    ///
    /// `compute` returning `Ok(Some(v))` publishes `v` under `key` for
    /// `ttl`. `Ok(None)` and `Err(_)` are never cached, so negative
    /// results are re-computed on every call until they turn positive.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(cached) = self.get_tolerant(key).await {
            return Ok(Some(cached));
        }

        let _guard = self.key_lock(key).await;

        // A winner may have published while we waited for the lock.
        if let Some(cached) = self.get_tolerant(key).await {
            return Ok(Some(cached));
        }

        let computed = compute().await?;
        if let Some(value) = &computed {
            if let Err(e) = self.set(key, value, ttl).await {
                tracing::warn!(key, error = %e, "Failed to publish computed cache value");
            }
        }
        Ok(computed)
    }

    /// Get, treating backend failures as misses.
    async fn get_tolerant<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;

    use super::*;
    use crate::memory::MemoryCache;

    fn handle() -> CacheHandle {
        CacheHandle::new(Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let cache = handle();
        cache
            .set("k", &vec![1u32, 2, 3], Duration::from_secs(60))
            .await
            .unwrap();
        let got: Option<Vec<u32>> = cache.get("k").await.unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryCache::new());
        store
            .set_raw("k", "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CacheHandle::new(store);
        let got: Option<Vec<u32>> = cache.get("k").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn positive_results_are_cached() {
        let cache = handle();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let got: Result<Option<u32>, Infallible> = cache
                .get_or_compute("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(7))
                })
                .await;
            assert_eq!(got.unwrap(), Some(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_results_are_not_cached() {
        let cache = handle();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let got: Result<Option<u32>, Infallible> = cache
                .get_or_compute("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await;
            assert_eq!(got.unwrap(), None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = handle();
        let result: Result<Option<u32>, &str> = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Err("boom") })
            .await;
        assert_eq!(result, Err("boom"));

        // A later successful compute still runs and publishes.
        let result: Result<Option<u32>, &str> = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Ok(Some(1)) })
            .await;
        assert_eq!(result, Ok(Some(1)));
    }

    #[tokio::test]
    async fn concurrent_misses_elect_a_single_winner() {
        let cache = handle();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..16).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                let got: Result<Option<u32>, Infallible> = cache
                    .get_or_compute("k", Duration::from_secs(60), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(Some(42))
                    })
                    .await;
                got.unwrap()
            }
        });

        for value in join_all(tasks).await {
            assert_eq!(value, Some(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_coalesce() {
        let cache = handle();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4u32).map(|i| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                let key = format!("k{i}");
                let got: Result<Option<u32>, Infallible> = cache
                    .get_or_compute(&key, Duration::from_secs(60), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(Some(i))
                    })
                    .await;
                got.unwrap()
            }
        });
        join_all(tasks).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
