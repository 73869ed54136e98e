//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::models::{
    GetResponse, HealthResponse, MessageResponse, PredictResponse, PrefetchRequest,
    PrefetchResponse, QueueStats, SetRequest, StatsResponse,
};
use crate::optimizer::Fetcher;
use crate::warmer::CacheWarmer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: CacheManager,
    pub warmer: CacheWarmer,
}

impl AppState {
    /// Creates a new AppState around a warmer and the cache it fills.
    pub fn new(warmer: CacheWarmer) -> Self {
        Self {
            manager: warmer.manager().clone(),
            warmer,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let manager = CacheManager::from_config(config);
        Self::new(CacheWarmer::from_config(config, manager, fetcher))
    }
}

/// Handler for PUT /cache
///
/// Stores a value with optional TTL, priority and size.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let (key, value, opts) = req.into_parts();
    state.manager.try_set(key.clone(), value, opts).await?;

    Ok(Json(MessageResponse::set(key)))
}

/// Handler for GET /cache/:key
///
/// A hit counts as an access for prediction.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.manager.try_get(&key).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    if !state.manager.delete(&key).await {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(MessageResponse::deleted(key)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.manager.clear().await;
    Json(MessageResponse::cleared())
}

/// Handler for GET /stats
///
/// Cache counters plus warmup, resource and queue statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.manager.stats().await;
    let scheduler = state.warmer.scheduler();

    Json(StatsResponse::new(
        cache,
        state.warmer.stats(),
        state.warmer.optimizer().stats(),
        QueueStats {
            pending: scheduler.pending(),
            in_flight: scheduler.in_flight(),
            max_concurrent: scheduler.max_concurrent(),
        },
    ))
}

/// Handler for POST /access/:key
///
/// Records an access served outside the cache.
pub async fn access_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }

    state.manager.record_access(&key).await;
    Ok(Json(MessageResponse::access_recorded(key)))
}

/// Handler for GET /predict/:key
pub async fn predict_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<PredictResponse> {
    let predictions = state.manager.predict_next(&key).await;
    Json(PredictResponse { key, predictions })
}

/// Handler for POST /prefetch
///
/// Queues a resource for a background load; responds before it is loaded.
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Json(req): Json<PrefetchRequest>,
) -> Result<(StatusCode, Json<PrefetchResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let resource = req.into_resource();
    let id = resource.id.clone();
    let queued = state.warmer.enqueue_prefetch(resource);

    Ok((StatusCode::ACCEPTED, Json(PrefetchResponse { id, queued })))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
