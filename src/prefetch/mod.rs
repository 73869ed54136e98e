//! Prefetch Module
//!
//! Background loading of predicted resources: the bounded scheduler and the
//! retry helper used by its loaders.

mod retry;
mod scheduler;

pub use retry::{retry_with_backoff, RetryPolicy};
pub use scheduler::{PrefetchLoader, PrefetchScheduler};
