//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, CacheValue};
use crate::optimizer::ResourceStats;
use crate::predict::Prediction;
use crate::warmer::WarmupStats;

/// Response body for the GET operation (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: CacheValue,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: CacheValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Generic acknowledgement for writes (PUT /cache, DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Success message
    pub message: String,
    /// The key the operation applied to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MessageResponse {
    pub fn set(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key: Some(key),
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key: Some(key),
        }
    }

    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            key: None,
        }
    }

    pub fn access_recorded(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Access to '{}' recorded", key),
            key: Some(key),
        }
    }
}

/// Prefetch queue occupancy
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub in_flight: usize,
    pub max_concurrent: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub warmup: WarmupStats,
    pub resources: ResourceStats,
    pub prefetch: QueueStats,
}

impl StatsResponse {
    pub fn new(
        cache: CacheStats,
        warmup: WarmupStats,
        resources: ResourceStats,
        prefetch: QueueStats,
    ) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            warmup,
            resources,
            prefetch,
        }
    }
}

/// Response body for GET /predict/:key
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub key: String,
    pub predictions: Vec<Prediction>,
}

/// Response body for POST /prefetch
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchResponse {
    pub id: String,
    /// False when the resource was already queued or loading
    pub queued: bool,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
