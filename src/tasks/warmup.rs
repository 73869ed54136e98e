//! Warmup Task
//!
//! Background task that runs a warmup pass on a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::warmer::CacheWarmer;

/// Spawns a background task that calls [`CacheWarmer::warmup_tick`] every
/// `interval`. Loads happen on the scheduler's workers, so a slow origin
/// never delays the next pass.
pub fn spawn_warmup_task(warmer: CacheWarmer, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting warmup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let queued = warmer.warmup_tick().await;
            if queued > 0 {
                debug!("Warmup: queued {} prefetches", queued);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, EntryOrigin, EvictionPolicy};
    use crate::manager::CacheManager;
    use crate::optimizer::{MemoryFetcher, OptimizerConfig, Resource, ResourceKind, ResourceOptimizer};
    use crate::predict::AccessPredictor;
    use crate::prefetch::{PrefetchScheduler, RetryPolicy};
    use bytes::Bytes;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_warmup_task_prefetches_in_background() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("mem://pricing", Bytes::from_static(b"<pricing>"));
        let manager = CacheManager::new(
            CacheStore::new(1024, 10, 60_000, EvictionPolicy::Lru),
            AccessPredictor::default(),
        );
        let warmer = CacheWarmer::new(
            manager.clone(),
            PrefetchScheduler::new(2),
            Arc::new(ResourceOptimizer::new(fetcher, OptimizerConfig::default())),
            RetryPolicy::default(),
        );
        warmer.register(Resource::new("pricing", "mem://pricing", ResourceKind::Data));
        manager.record_access("home").await;
        manager.record_access("pricing").await;
        manager.record_access("home").await;

        let workers = warmer.spawn_workers();
        let handle = spawn_warmup_task(warmer.clone(), Duration::from_millis(5000));

        tokio::time::sleep(Duration::from_millis(5100)).await;

        let entry = manager.entry("pricing").await.expect("prefetched");
        assert_eq!(entry.origin, EntryOrigin::Predicted);
        assert_eq!(warmer.stats().successful, 1);

        handle.abort();
        for worker in workers {
            worker.abort();
        }
    }
}
