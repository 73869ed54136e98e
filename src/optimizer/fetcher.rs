//! Resource fetchers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::optimizer::Resource;

// == Fetcher ==
/// Retrieves the raw bytes of a resource. A failed attempt is a
/// `LoadFailed` error; retrying is up to the caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, resource: &Resource) -> Result<Bytes>;
}

// == HTTP Fetcher ==
/// Fetches resources over HTTP(S). The timeout applies to each attempt.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<Bytes> {
        debug!("Fetching '{}' from {}", resource.id, resource.url);

        let response = self.client.get(&resource.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::LoadFailed(format!(
                "HTTP error for {}: status {}",
                resource.url, status
            )));
        }

        Ok(response.bytes().await?)
    }
}

// == Memory Fetcher ==
/// Serves resources from an in-process table keyed by URL, e.g. assets
/// bundled with the binary. Failures can be injected per URL.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    assets: Mutex<HashMap<String, Bytes>>,
    failures: Mutex<HashMap<String, u32>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every fetch, to simulate a slow origin.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.lock_assets().insert(url.into(), body.into());
    }

    /// Makes the next `count` fetches of `url` fail.
    pub fn fail_next(&self, url: impl Into<String>, count: u32) {
        self.lock_failures().insert(url.into(), count);
    }

    /// Total fetch attempts, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock_assets(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.assets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        self.failures.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        {
            let mut failures = self.lock_failures();
            if let Some(remaining) = failures.get_mut(&resource.url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CacheError::LoadFailed(format!(
                        "Injected failure for {}",
                        resource.url
                    )));
                }
            }
        }

        self.lock_assets()
            .get(&resource.url)
            .cloned()
            .ok_or_else(|| CacheError::LoadFailed(format!("No asset at {}", resource.url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::ResourceKind;

    #[tokio::test]
    async fn test_memory_fetcher_serves_and_fails() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("mem://a", Bytes::from_static(b"hello"));
        fetcher.fail_next("mem://a", 1);
        let resource = Resource::new("a", "mem://a", ResourceKind::Data);

        assert!(matches!(
            fetcher.fetch(&resource).await,
            Err(CacheError::LoadFailed(_))
        ));
        assert_eq!(fetcher.fetch(&resource).await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_fetcher_missing_asset() {
        let fetcher = MemoryFetcher::new();
        let resource = Resource::new("b", "mem://b", ResourceKind::Data);

        assert!(fetcher.fetch(&resource).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_fetcher_latency() {
        let fetcher = MemoryFetcher::new().with_latency(Duration::from_millis(250));
        fetcher.insert("mem://slow", Bytes::from_static(b"late"));
        let resource = Resource::new("slow", "mem://slow", ResourceKind::Data);

        let started = tokio::time::Instant::now();
        assert_eq!(fetcher.fetch(&resource).await.unwrap(), Bytes::from_static(b"late"));
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(Duration::from_secs(10)).is_ok());
    }
}
