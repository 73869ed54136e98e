//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::manager::CacheManager;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// Reads already drop expired entries lazily; the sweep reclaims the space
/// of entries nobody asks for again. Abort the returned handle on shutdown.
pub fn spawn_cleanup_task(manager: CacheManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = manager.cleanup_expired().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, EvictionPolicy, SetOptions};
    use crate::predict::AccessPredictor;

    fn manager() -> CacheManager {
        CacheManager::new(
            CacheStore::new(1024, 100, 300_000, EvictionPolicy::Lru),
            AccessPredictor::default(),
        )
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let manager = manager();
        manager
            .set("expire_soon", "value", SetOptions::new().ttl_ms(10))
            .await;

        let handle = spawn_cleanup_task(manager.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = manager.stats().await;
        assert_eq!(stats.entries, 0, "Expired entry should have been swept");
        assert_eq!(stats.expired, 1);
        // Swept, not read: no miss recorded
        assert_eq!(stats.misses, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let manager = manager();
        manager
            .set("long_lived", "value", SetOptions::new().ttl_ms(3_600_000))
            .await;

        let handle = spawn_cleanup_task(manager.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(manager.contains("long_lived").await, "Valid entry should not be removed");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(manager(), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
