//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{create_cache_strategy, EvictionPolicy};

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte budget of the cache
    pub max_size_bytes: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Interval between expired-entry sweeps
    pub cleanup_interval_ms: u64,
    /// Victim selection strategy
    pub eviction_policy: EvictionPolicy,
    /// Maximum concurrent prefetch loads
    pub prefetch_concurrency: usize,
    /// Minimum transition probability for a prediction to be prefetched
    pub prefetch_threshold: f64,
    /// Length of the recent-access window used for prediction
    pub sequence_length: usize,
    /// Retries after the first failed load attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay_ms: u64,
    /// Images above this size are re-encoded before caching
    pub compression_threshold_bytes: u64,
    /// JPEG quality factor in `(0, 1]`
    pub image_quality: f32,
    /// Interval between warmup passes
    pub warmup_interval_ms: u64,
    /// Viewport margin that triggers a load
    pub preload_margin_px: u32,
    /// Timeout of a single fetch attempt
    pub request_timeout_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE_BYTES` (default: 100 MB)
    /// - `MAX_ENTRIES` (default: 1000)
    /// - `DEFAULT_TTL_MS` (default: 1 hour)
    /// - `CLEANUP_INTERVAL_MS` (default: 5 minutes)
    /// - `EVICTION_POLICY` - lru, lfu, fifo, priority or ttl (default: lru)
    /// - `PREFETCH_CONCURRENCY` (default: 3)
    /// - `PREFETCH_THRESHOLD` (default: 0.7)
    /// - `SEQUENCE_LENGTH` (default: 5)
    /// - `MAX_RETRIES` (default: 3)
    /// - `RETRY_DELAY_MS` (default: 1000)
    /// - `COMPRESSION_THRESHOLD_BYTES` (default: 50 KB)
    /// - `IMAGE_QUALITY` (default: 0.8)
    /// - `WARMUP_INTERVAL_MS` (default: 5000)
    /// - `PRELOAD_MARGIN_PX` (default: 1000)
    /// - `REQUEST_TIMEOUT_MS` (default: 10000)
    /// - `SERVER_PORT` (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_size_bytes: env_or("MAX_SIZE_BYTES", defaults.max_size_bytes),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            cleanup_interval_ms: env_or("CLEANUP_INTERVAL_MS", defaults.cleanup_interval_ms),
            eviction_policy: env::var("EVICTION_POLICY")
                .map(|v| create_cache_strategy(&v))
                .unwrap_or(defaults.eviction_policy),
            prefetch_concurrency: env_or("PREFETCH_CONCURRENCY", defaults.prefetch_concurrency),
            prefetch_threshold: env_or("PREFETCH_THRESHOLD", defaults.prefetch_threshold),
            sequence_length: env_or("SEQUENCE_LENGTH", defaults.sequence_length),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms),
            compression_threshold_bytes: env_or(
                "COMPRESSION_THRESHOLD_BYTES",
                defaults.compression_threshold_bytes,
            ),
            image_quality: env_or("IMAGE_QUALITY", defaults.image_quality),
            warmup_interval_ms: env_or("WARMUP_INTERVAL_MS", defaults.warmup_interval_ms),
            preload_margin_px: env_or("PRELOAD_MARGIN_PX", defaults.preload_margin_px),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn warmup_interval(&self) -> Duration {
        Duration::from_millis(self.warmup_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            max_entries: 1000,
            default_ttl_ms: 3_600_000,
            cleanup_interval_ms: 300_000,
            eviction_policy: EvictionPolicy::Lru,
            prefetch_concurrency: 3,
            prefetch_threshold: 0.7,
            sequence_length: 5,
            max_retries: 3,
            retry_delay_ms: 1000,
            compression_threshold_bytes: 50 * 1024,
            image_quality: 0.8,
            warmup_interval_ms: 5000,
            preload_margin_px: 1000,
            request_timeout_ms: 10_000,
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
