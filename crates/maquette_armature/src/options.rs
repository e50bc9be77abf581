//! Remote option resolution and caching.
//!
//! Option-backed fields can point at a URL instead of carrying their option
//! list inline. Fetching goes through an [`OptionsCache`]: the first request
//! for a URL performs the fetch, every concurrent or later request for the
//! same URL awaits or reuses that result. A failed fetch leaves no entry
//! behind, so the URL can be retried.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

/// A fetch that did not produce data.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch options from `{url}`: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of initializing a field's remote data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Data was fetched (or found cached) and applied to the field
    Applied,
    /// The fetch failed; the field keeps its current options
    Failed,
    /// The field declares no URL, nothing to do
    Skipped,
}

/// Source of remote option data. Implementations typically wrap an HTTP
/// client; tests wrap a closure.
#[async_trait]
pub trait OptionsFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// Adapter turning an async closure into an [`OptionsFetcher`].
pub struct FnFetcher<F>(pub F)
where
    F: Fn(&str) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync;

#[async_trait]
impl<F> OptionsFetcher for FnFetcher<F>
where
    F: Fn(&str) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync,
{
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        (self.0)(url).await
    }
}

/// URL-keyed cache of fetched option data.
///
/// Each URL maps to a cell resolved at most once: the first requester runs
/// the fetch while later requesters await the same cell. Failure clears
/// nothing because nothing was stored, so retries go through.
#[derive(Debug, Default)]
pub struct OptionsCache {
    entries: DashMap<String, Arc<OnceCell<Value>>>,
}

static GLOBAL: Lazy<Arc<OptionsCache>> = Lazy::new(|| Arc::new(OptionsCache::default()));

impl OptionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by all form stores by default.
    pub fn global() -> Arc<OptionsCache> {
        GLOBAL.clone()
    }

    /// Cached data for a URL, if a fetch already completed.
    pub fn get(&self, url: &str) -> Option<Value> {
        self.entries
            .get(url)
            .and_then(|cell| cell.get().cloned())
    }

    /// Seed the cache directly, bypassing any fetcher.
    pub fn insert(&self, url: &str, data: Value) {
        let cell = self
            .entries
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        // a racing fetch may already have resolved the cell; keep its value
        let _ = cell.set(data);
    }

    /// Drop a cached entry so the next request fetches anew.
    pub fn evict(&self, url: &str) {
        self.entries.remove(url);
    }

    /// Resolve a URL through the cache. Concurrent callers for the same URL
    /// share a single fetch; the winner's data is memoized.
    pub async fn resolve(
        &self,
        url: &str,
        fetcher: &dyn OptionsFetcher,
    ) -> Result<Value, FetchError> {
        let cell = self
            .entries
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = cell
            .get_or_try_init(|| async {
                debug!(%url, "fetching options");
                fetcher.fetch(url).await
            })
            .await?;
        Ok(value.clone())
    }

    /// Warm the cache for several URLs at once. Fails on the first URL that
    /// cannot be fetched; successfully fetched URLs stay cached.
    pub async fn prefetch(
        &self,
        urls: &[String],
        fetcher: &dyn OptionsFetcher,
    ) -> Result<Vec<Value>, FetchError> {
        futures::future::try_join_all(urls.iter().map(|url| self.resolve(url, fetcher))).await
    }
}

/// Warm the process-wide cache for several URLs before any form exists.
pub async fn prefetch_options(
    urls: &[String],
    fetcher: &dyn OptionsFetcher,
) -> Result<Vec<Value>, FetchError> {
    OptionsCache::global().prefetch(urls, fetcher).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OptionsFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("boom") {
                return Err(FetchError::new(url, "unreachable"));
            }
            Ok(serde_json::json!([{"value": url}]))
        }
    }

    #[tokio::test]
    async fn test_concurrent_resolve_fetches_once() {
        let cache = Arc::new(OptionsCache::new());
        let fetcher = Arc::new(CountingFetcher { calls: AtomicUsize::new(0) });

        let results = futures::future::join_all((0..8).map(|_| {
            let cache = cache.clone();
            let fetcher = fetcher.clone();
            async move { cache.resolve("https://api/options", fetcher.as_ref()).await }
        }))
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retryable() {
        let cache = OptionsCache::new();
        let fetcher = CountingFetcher { calls: AtomicUsize::new(0) };

        assert!(cache.resolve("https://api/boom", &fetcher).await.is_err());
        assert!(cache.get("https://api/boom").is_none());
        // the second attempt fetches again instead of replaying the failure
        assert!(cache.resolve("https://api/boom", &fetcher).await.is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_insert_seeds_without_fetch() {
        let cache = OptionsCache::new();
        let fetcher = CountingFetcher { calls: AtomicUsize::new(0) };

        cache.insert("https://api/seeded", serde_json::json!(["x"]));
        let data = cache.resolve("https://api/seeded", &fetcher).await.unwrap();
        assert_eq!(data, serde_json::json!(["x"]));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
