//! Cache Manager
//!
//! The shared handle consumers hold. It owns the store and the access
//! predictor behind one lock, so a successful `get`/`set` and the access it
//! records happen as one step and are observed in call order.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, CacheValue, EntryOrigin, SetOptions};
use crate::config::Config;
use crate::error::Result;
use crate::predict::{AccessPredictor, Prediction, PredictorConfig};

#[derive(Debug)]
struct CacheState {
    store: CacheStore,
    predictor: AccessPredictor,
}

// == Cache Manager ==
/// Cheap to clone; clones share the same cache.
///
/// The plain `get`/`set`/`delete` methods report failures as `Option`/`bool`
/// and log the cause. Use the `try_` variants to get the error itself.
/// Sets marked as predicted are stored without being recorded as accesses.
#[derive(Debug, Clone)]
pub struct CacheManager {
    state: Arc<RwLock<CacheState>>,
}

impl CacheManager {
    pub fn new(store: CacheStore, predictor: AccessPredictor) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState { store, predictor })),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheStore::from_config(config),
            AccessPredictor::new(PredictorConfig::from(config)),
        )
    }

    // == Get ==
    /// Looks up `key`. Mutating: a hit updates recency and hit counts and is
    /// recorded as an access; an expired entry is removed.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        match self.try_get(key).await {
            Ok(value) => Some(value),
            Err(err) if err.is_miss() => {
                debug!("Cache miss for '{}': {}", key, err);
                None
            }
            Err(err) => {
                warn!("Error getting cache entry '{}': {}", key, err);
                None
            }
        }
    }

    pub async fn try_get(&self, key: &str) -> Result<CacheValue> {
        let mut state = self.state.write().await;
        let value = state.store.get(key)?;
        state.predictor.record_access(key);
        Ok(value)
    }

    // == Set ==
    /// Stores `value`, evicting as needed. Returns false when the entry was
    /// rejected.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        opts: SetOptions,
    ) -> bool {
        let key = key.into();
        match self.try_set(key.clone(), value, opts).await {
            Ok(()) => true,
            Err(err) => {
                warn!("Error setting cache entry '{}': {}", key, err);
                false
            }
        }
    }

    pub async fn try_set(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        opts: SetOptions,
    ) -> Result<()> {
        let key = key.into();
        let predicted = opts.origin == EntryOrigin::Predicted;
        let mut state = self.state.write().await;
        state.store.set(key.clone(), value, opts)?;
        // Prefetches are not user accesses
        if !predicted {
            state.predictor.record_access(&key);
        }
        Ok(())
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> bool {
        match self.state.write().await.store.delete(key) {
            Ok(()) => true,
            Err(err) => {
                debug!("Nothing to delete for '{}': {}", key, err);
                false
            }
        }
    }

    /// Drops every entry and resets the counters. The access model is kept.
    pub async fn clear(&self) {
        self.state.write().await.store.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.state.read().await.store.stats()
    }

    /// True when a live entry exists. Not an access.
    pub async fn contains(&self, key: &str) -> bool {
        self.state.read().await.store.contains(key)
    }

    /// Metadata snapshot of a live entry. Not an access.
    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.state
            .read()
            .await
            .store
            .entry(key)
            .filter(|entry| !entry.is_expired())
            .cloned()
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.state.write().await.store.cleanup_expired()
    }

    // == Prediction ==
    /// Records an access that did not go through `get`/`set`, e.g. a
    /// resource served from elsewhere.
    pub async fn record_access(&self, key: &str) {
        self.state.write().await.predictor.record_access(key);
    }

    pub async fn predict_next(&self, key: &str) -> Vec<Prediction> {
        self.state.read().await.predictor.predict_next(key)
    }

    /// The most recently accessed key.
    pub async fn current_access(&self) -> Option<String> {
        self.state.read().await.predictor.current().map(str::to_string)
    }
}
