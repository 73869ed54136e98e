//! Cache Warmer
//!
//! Ties the engine together: predictions from the access model are looked
//! up in the resource catalog, queued on the prefetch scheduler, loaded
//! through the optimizer with retries and written into the cache marked as
//! predicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheValue, Priority, SetOptions};
use crate::config::Config;
use crate::error::Result;
use crate::manager::CacheManager;
use crate::optimizer::{
    Fetcher, LoadedResource, OptimizerConfig, Placement, Resource, ResourceOptimizer, Viewport,
};
use crate::prefetch::{retry_with_backoff, PrefetchLoader, PrefetchScheduler, RetryPolicy};

// == Warmup Stats ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmupStats {
    /// Predictions produced by warmup passes
    pub total_predicted: u64,
    pub successful: u64,
    pub failed: u64,
    pub in_progress: u64,
}

#[derive(Debug, Default)]
struct WarmupCounters {
    total_predicted: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    in_progress: AtomicU64,
}

impl WarmupCounters {
    fn snapshot(&self) -> WarmupStats {
        WarmupStats {
            total_predicted: self.total_predicted.load(Ordering::Relaxed),
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_progress: self.in_progress.load(Ordering::Relaxed),
        }
    }
}

struct WarmerInner {
    manager: CacheManager,
    scheduler: PrefetchScheduler,
    optimizer: Arc<ResourceOptimizer>,
    retry: RetryPolicy,
    counters: WarmupCounters,
}

// == Cache Warmer ==
/// Cheap to clone; clones share the catalog, queue and counters.
#[derive(Clone)]
pub struct CacheWarmer {
    inner: Arc<WarmerInner>,
}

impl CacheWarmer {
    pub fn new(
        manager: CacheManager,
        scheduler: PrefetchScheduler,
        optimizer: Arc<ResourceOptimizer>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(WarmerInner {
                manager,
                scheduler,
                optimizer,
                retry,
                counters: WarmupCounters::default(),
            }),
        }
    }

    pub fn from_config(config: &Config, manager: CacheManager, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(
            manager,
            PrefetchScheduler::new(config.prefetch_concurrency),
            Arc::new(ResourceOptimizer::new(fetcher, OptimizerConfig::from(config))),
            RetryPolicy::from(config),
        )
    }

    pub fn manager(&self) -> &CacheManager {
        &self.inner.manager
    }

    pub fn scheduler(&self) -> &PrefetchScheduler {
        &self.inner.scheduler
    }

    pub fn optimizer(&self) -> &ResourceOptimizer {
        &self.inner.optimizer
    }

    pub fn stats(&self) -> WarmupStats {
        self.inner.counters.snapshot()
    }

    // == Catalog ==
    /// Makes `resource` known, so predictions naming its id can be prefetched.
    pub fn register(&self, resource: Resource) {
        self.inner.optimizer.register(resource);
    }

    /// Registers `resource` along with its page position for viewport triggering.
    pub fn register_placement(&self, resource: Resource, placement: Placement) {
        self.inner.optimizer.register_placement(resource, placement);
    }

    pub fn resource(&self, id: &str) -> Option<Resource> {
        self.inner.optimizer.tracked_resource(id).map(|t| t.resource)
    }

    // == Enqueue ==
    /// Registers `resource` and queues it for a background load.
    pub fn enqueue_prefetch(&self, resource: Resource) -> bool {
        self.inner.optimizer.register(resource.clone());
        self.inner.scheduler.enqueue(resource)
    }

    // == Warmup Tick ==
    /// One warmup pass: predicts successors of the most recent access and
    /// queues the catalogued, uncached ones with their probability as
    /// priority. Returns the number queued.
    pub async fn warmup_tick(&self) -> usize {
        let Some(current) = self.inner.manager.current_access().await else {
            return 0;
        };

        let predictions = self.inner.manager.predict_next(&current).await;
        self.inner
            .counters
            .total_predicted
            .fetch_add(predictions.len() as u64, Ordering::Relaxed);

        let mut queued = 0;
        for prediction in predictions {
            let Some(resource) = self.resource(&prediction.key) else {
                debug!("No catalog entry for predicted '{}'", prediction.key);
                continue;
            };
            if self.inner.manager.contains(&prediction.key).await {
                continue;
            }
            if self
                .inner
                .scheduler
                .enqueue(resource.with_priority(prediction.probability))
            {
                queued += 1;
            }
        }

        if queued > 0 {
            debug!("Warmup after '{}' queued {} prefetches", current, queued);
        }
        queued
    }

    // == Viewport ==
    /// Queues uncached resources that came within the preload margin.
    pub async fn viewport_changed(&self, viewport: Viewport) -> usize {
        let mut queued = 0;
        for resource in self.inner.optimizer.triggered_by(viewport) {
            if self.inner.manager.contains(&resource.id).await {
                continue;
            }
            if self.inner.scheduler.enqueue(resource) {
                queued += 1;
            }
        }
        queued
    }

    // == Fetch ==
    /// Returns the cached value for `resource`, loading and caching it on a
    /// miss. A single load attempt is made and its `LoadFailed` is returned
    /// to the caller; only background prefetches retry.
    pub async fn fetch(&self, resource: &Resource) -> Result<CacheValue> {
        if let Some(value) = self.inner.manager.get(&resource.id).await {
            return Ok(value);
        }

        self.inner.optimizer.register(resource.clone());
        let loaded = self.inner.optimizer.load_tracked(resource).await?;
        let opts = set_options(resource, &loaded);
        let value = CacheValue::Bytes(loaded.bytes.clone());
        self.inner
            .manager
            .try_set(resource.id.clone(), loaded.bytes, opts)
            .await?;
        Ok(value)
    }

    async fn load_with_retry(&self, resource: &Resource) -> Result<LoadedResource> {
        let optimizer = self.inner.optimizer.as_ref();
        retry_with_backoff(&self.inner.retry, &resource.id, move |_| {
            optimizer.load_tracked(resource)
        })
        .await
    }

    // == Workers ==
    /// Starts the scheduler's long-lived workers with this warmer as loader.
    pub fn spawn_workers(&self) -> Vec<JoinHandle<()>> {
        self.inner.scheduler.spawn_workers(Arc::new(self.clone()))
    }

    /// Loads everything queued and waits for completion.
    pub async fn drain(&self) {
        self.inner.scheduler.drain(self).await;
    }

    /// Drops queued prefetches. In-flight loads finish.
    pub fn shutdown(&self) {
        let pending = self.inner.scheduler.pending();
        self.inner.scheduler.clear();
        info!("Cache warmer stopped, dropped {} queued prefetches", pending);
    }
}

fn set_options(resource: &Resource, loaded: &LoadedResource) -> SetOptions {
    SetOptions::new()
        .size(loaded.bytes.len() as u64)
        .priority(Priority::from_weight(resource.priority))
}

#[async_trait]
impl PrefetchLoader for CacheWarmer {
    async fn load(&self, resource: &Resource) -> Result<()> {
        let counters = &self.inner.counters;
        counters.in_progress.fetch_add(1, Ordering::Relaxed);

        let result = match self.load_with_retry(resource).await {
            Ok(loaded) => {
                let opts = set_options(resource, &loaded).predicted();
                self.inner
                    .manager
                    .try_set(resource.id.clone(), loaded.bytes, opts)
                    .await
            }
            Err(err) => Err(err),
        };

        counters.in_progress.fetch_sub(1, Ordering::Relaxed);
        match &result {
            Ok(()) => counters.successful.fetch_add(1, Ordering::Relaxed),
            Err(_) => counters.failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }
}
