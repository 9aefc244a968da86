//! Per-ticker lookup cache.
//!
//! Keys are normalised ticker symbols. Entries expire after the configured
//! freshness window; callers can also drop one ticker or everything.

use crate::config::CacheConfig;
use cached::{Cached, TimedCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

pub struct LookupCache<V> {
    name: &'static str,
    inner: Option<Arc<RwLock<TimedCache<String, V>>>>,
}

impl<V: Clone> LookupCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            inner: Some(Arc::new(RwLock::new(TimedCache::with_lifespan(ttl)))),
        }
    }

    /// A cache that never stores anything; every lookup fetches.
    pub fn disabled(name: &'static str) -> Self {
        Self { name, inner: None }
    }

    pub fn from_config(name: &'static str, config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(name, config.ttl())
        } else {
            Self::disabled(name)
        }
    }

    pub async fn get(&self, symbol: &str) -> Option<V> {
        let inner = self.inner.as_ref()?;
        // TimedCache evicts on read, so even lookups need the write lock.
        let mut cache = inner.write().await;
        cache.cache_get(&symbol.to_string()).cloned()
    }

    pub async fn insert(&self, symbol: &str, value: V) {
        if let Some(inner) = &self.inner {
            let mut cache = inner.write().await;
            let _ = cache.cache_set(symbol.to_string(), value);
        }
    }

    /// Cached value for `symbol`, or the result of `fetch`. Failures are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, symbol: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(symbol).await {
            debug!("{} cache hit: {}", self.name, symbol);
            return Ok(value);
        }
        debug!("{} cache miss: {}", self.name, symbol);

        let value = fetch().await?;
        self.insert(symbol, value.clone()).await;
        Ok(value)
    }

    pub async fn invalidate(&self, symbol: &str) {
        if let Some(inner) = &self.inner {
            let mut cache = inner.write().await;
            let _ = cache.cache_remove(&symbol.to_string());
        }
    }

    pub async fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.write().await.cache_clear();
        }
    }

    pub async fn len(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.read().await.cache_size(),
            None => 0,
        }
    }
}

impl<V> Clone for LookupCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn test_repeat_lookup_skips_fetch() {
        let cache = LookupCache::new("test", Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let a = cache.get_or_fetch("BBCA.JK", || counted(&calls, 1)).await.unwrap();
        let b = cache.get_or_fetch("BBCA.JK", || counted(&calls, 2)).await.unwrap();
        assert_eq!((a, b), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.get_or_fetch("TLKM.JK", || counted(&calls, 3)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: LookupCache<u32> = LookupCache::new("test", Duration::from_secs(60));
        let err = cache
            .get_or_fetch("GOTO.JK", || async { Err::<u32, _>("down".to_string()) })
            .await;
        assert!(err.is_err());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = LookupCache::new("test", Duration::from_secs(60));
        cache.insert("BBCA.JK", 1u32).await;
        cache.insert("BBRI.JK", 2u32).await;

        cache.invalidate("BBCA.JK").await;
        assert_eq!(cache.get("BBCA.JK").await, None);
        assert_eq!(cache.get("BBRI.JK").await, Some(2));

        cache.clear().await;
        assert_eq!(cache.get("BBRI.JK").await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = LookupCache::new("test", Duration::from_millis(20));
        cache.insert("ASII.JK", 7u32).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("ASII.JK").await, None);
    }

    #[test]
    fn test_disabled_cache_always_fetches() {
        let cache: LookupCache<u32> = LookupCache::from_config(
            "test",
            &CacheConfig {
                enabled: false,
                ttl_secs: 60,
            },
        );
        let calls = AtomicUsize::new(0);
        tokio_test::block_on(async {
            cache.get_or_fetch("BBCA.JK", || counted(&calls, 1)).await.unwrap();
            cache.get_or_fetch("BBCA.JK", || counted(&calls, 1)).await.unwrap();
            assert_eq!(cache.len().await, 0);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
