//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache occupancy and counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Bytes currently accounted to live entries
    pub size_bytes: u64,
    /// Current number of entries in the cache
    pub entries: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted under capacity pressure
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expired: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    // == Occupancy ==
    /// Updates the occupancy fields.
    pub fn set_occupancy(&mut self, entries: usize, size_bytes: u64) {
        self.entries = entries;
        self.size_bytes = size_bytes;
    }
}
