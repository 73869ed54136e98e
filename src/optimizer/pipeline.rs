//! Resource Optimizer
//!
//! Fetches resources, applies the transform registered for their kind and
//! tracks the load status of every resource it has seen. Resources with a
//! page placement can be triggered by viewport changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::optimizer::{
    Fetcher, ImageRecompressor, PassThrough, Placement, ProximityObserver, Resource, ResourceKind,
    ResourceTransform, Viewport,
};

// == Optimizer Config ==
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub compression_threshold_bytes: u64,
    pub image_quality: f32,
    pub preload_margin_px: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            compression_threshold_bytes: 50 * 1024,
            image_quality: 0.8,
            preload_margin_px: 1000,
        }
    }
}

impl From<&Config> for OptimizerConfig {
    fn from(config: &Config) -> Self {
        Self {
            compression_threshold_bytes: config.compression_threshold_bytes,
            image_quality: config.image_quality,
            preload_margin_px: config.preload_margin_px,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TrackedResource {
    pub resource: Resource,
    pub status: ResourceStatus,
    pub attempts: u32,
    pub optimized: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceStats {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub optimized: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResource {
    pub bytes: Bytes,
    pub optimized: bool,
}

// == Resource Optimizer ==
pub struct ResourceOptimizer {
    fetcher: Arc<dyn Fetcher>,
    transforms: HashMap<ResourceKind, Arc<dyn ResourceTransform>>,
    tracked: Mutex<HashMap<String, TrackedResource>>,
    observer: Mutex<ProximityObserver>,
}

impl ResourceOptimizer {
    /// Images are recompressed; every other kind passes through.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: OptimizerConfig) -> Self {
        let mut transforms: HashMap<ResourceKind, Arc<dyn ResourceTransform>> = HashMap::new();
        transforms.insert(
            ResourceKind::Image,
            Arc::new(ImageRecompressor::new(
                config.compression_threshold_bytes,
                config.image_quality,
            )),
        );

        Self {
            fetcher,
            transforms,
            tracked: Mutex::new(HashMap::new()),
            observer: Mutex::new(ProximityObserver::new(config.preload_margin_px)),
        }
    }

    /// Replaces the transform used for `kind`.
    pub fn with_transform(mut self, kind: ResourceKind, transform: Arc<dyn ResourceTransform>) -> Self {
        self.transforms.insert(kind, transform);
        self
    }

    fn transform_for(&self, kind: ResourceKind) -> Arc<dyn ResourceTransform> {
        self.transforms
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(PassThrough))
    }

    fn tracked(&self) -> MutexGuard<'_, HashMap<String, TrackedResource>> {
        self.tracked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn observer(&self) -> MutexGuard<'_, ProximityObserver> {
        self.observer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Load ==
    /// Fetches `resource` and runs its transform on the blocking pool.
    /// A single attempt; the caller decides on retries.
    pub async fn load(&self, resource: &Resource) -> Result<LoadedResource> {
        let raw = self.fetcher.fetch(resource).await?;

        let transform = self.transform_for(resource.kind);
        let owned = resource.clone();
        let transformed = tokio::task::spawn_blocking(move || transform.transform(&owned, raw))
            .await
            .map_err(|e| CacheError::Internal(format!("Transform task failed: {}", e)))?;

        debug!(
            "Loaded '{}' ({}, {} bytes{})",
            resource.id,
            resource.kind,
            transformed.bytes.len(),
            if transformed.optimized { ", optimized" } else { "" }
        );

        Ok(LoadedResource {
            bytes: transformed.bytes,
            optimized: transformed.optimized,
        })
    }

    /// Like [`load`](Self::load), recording the outcome in the status table.
    pub async fn load_tracked(&self, resource: &Resource) -> Result<LoadedResource> {
        {
            let mut tracked = self.tracked();
            let entry = tracked
                .entry(resource.id.clone())
                .or_insert_with(|| TrackedResource::pending(resource.clone()));
            entry.status = ResourceStatus::Loading;
            entry.attempts += 1;
        }

        let result = self.load(resource).await;

        let mut tracked = self.tracked();
        if let Some(entry) = tracked.get_mut(&resource.id) {
            match &result {
                Ok(loaded) => {
                    entry.status = ResourceStatus::Loaded;
                    entry.optimized = loaded.optimized;
                    entry.error = None;
                }
                Err(err) => {
                    error!("Error loading resource '{}': {}", resource.id, err);
                    entry.status = ResourceStatus::Failed;
                    entry.error = Some(err.to_string());
                }
            }
        }
        result
    }

    // == Tracking ==
    /// Starts tracking `resource` as pending. Re-registering keeps the
    /// current status and updates the descriptor.
    pub fn register(&self, resource: Resource) {
        let mut tracked = self.tracked();
        match tracked.get_mut(&resource.id) {
            Some(entry) => entry.resource = resource,
            None => {
                tracked.insert(resource.id.clone(), TrackedResource::pending(resource));
            }
        }
    }

    /// Registers `resource` and its position on the page for viewport triggering.
    pub fn register_placement(&self, resource: Resource, placement: Placement) {
        self.observer().register(resource.id.clone(), placement);
        self.register(resource);
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.observer().unregister(id);
        self.tracked().remove(id).is_some()
    }

    pub fn status(&self, id: &str) -> Option<ResourceStatus> {
        self.tracked().get(id).map(|t| t.status)
    }

    pub fn tracked_resource(&self, id: &str) -> Option<TrackedResource> {
        self.tracked().get(id).cloned()
    }

    /// Resources near `viewport` that are neither loaded nor loading.
    pub fn triggered_by(&self, viewport: Viewport) -> Vec<Resource> {
        let ids = self.observer().observe(viewport);
        let tracked = self.tracked();

        ids.iter()
            .filter_map(|id| tracked.get(id))
            .filter(|t| matches!(t.status, ResourceStatus::Pending | ResourceStatus::Failed))
            .map(|t| t.resource.clone())
            .collect()
    }

    pub fn stats(&self) -> ResourceStats {
        let tracked = self.tracked();
        let mut stats = ResourceStats {
            total: tracked.len(),
            ..ResourceStats::default()
        };
        for entry in tracked.values() {
            match entry.status {
                ResourceStatus::Loaded => stats.loaded += 1,
                ResourceStatus::Failed => stats.failed += 1,
                _ => {}
            }
            if entry.optimized {
                stats.optimized += 1;
            }
        }
        stats
    }
}

impl TrackedResource {
    fn pending(resource: Resource) -> Self {
        Self {
            resource,
            status: ResourceStatus::Pending,
            attempts: 0,
            optimized: false,
            error: None,
        }
    }
}
