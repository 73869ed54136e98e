//! Cache Module
//!
//! Bounded in-memory object cache with byte accounting, TTL expiration and
//! pluggable eviction policies.

pub(crate) mod entry;
mod policy;
mod stats;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, EntryOrigin, Priority, SetOptions};
pub use policy::{create_cache_strategy, EvictionPolicy, Victim};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use value::CacheValue;

// == Public Constants ==
/// Maximum allowed key length in bytes. Keys are frequently resource URLs.
pub const MAX_KEY_LENGTH: usize = 2048;
