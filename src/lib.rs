//! Warmcache - An adaptive caching and prefetch engine
//!
//! A bounded object cache with pluggable eviction, an access model that
//! predicts the next resource, and a background warmer that prefetches
//! predicted resources with bounded concurrency and retries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod optimizer;
pub mod predict;
pub mod prefetch;
pub mod tasks;
pub mod warmer;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use tasks::{spawn_cleanup_task, spawn_warmup_task};
pub use warmer::{CacheWarmer, WarmupStats};
