//! Eviction Policy Module
//!
//! Victim selection strategies. A policy only reads entry metadata; all the
//! state it needs (ticks, counts, expiry) lives on the entries, so the store can
//! switch policies without migrating anything.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::CacheEntry;
use crate::error::CacheError;

// == Victim ==
/// Outcome of a victim selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Victim {
    /// Evict this key
    Key(String),
    /// Entries exist but the policy has no candidate (TTL with nothing expired)
    NoneAvailable,
    /// Nothing to evict
    Empty,
}

// == Eviction Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, oldest insert first among equals
    Lfu,
    /// Oldest insert first
    Fifo,
    /// Lowest priority first, oldest insert first among equals
    Priority,
    /// Earliest already-expired entry; no victim when nothing has expired
    Ttl,
}

impl EvictionPolicy {
    pub const ALL: [EvictionPolicy; 5] = [
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::Fifo,
        EvictionPolicy::Priority,
        EvictionPolicy::Ttl,
    ];

    // == Select Victim ==
    /// Picks exactly one entry to evict.
    ///
    /// Ties are broken by insertion order, so the result is deterministic for
    /// a given sequence of store operations.
    pub fn select_victim(&self, entries: &HashMap<String, CacheEntry>, now_ms: u64) -> Victim {
        if entries.is_empty() {
            return Victim::Empty;
        }

        let values = entries.values();
        let candidate = match self {
            EvictionPolicy::Lru => values.min_by_key(|e| (e.accessed_seq, e.inserted_seq)),
            EvictionPolicy::Lfu => values.min_by_key(|e| (e.hit_count, e.inserted_seq)),
            EvictionPolicy::Fifo => values.min_by_key(|e| e.inserted_seq),
            EvictionPolicy::Priority => values.min_by_key(|e| (e.priority, e.inserted_seq)),
            EvictionPolicy::Ttl => values
                .filter(|e| e.is_expired_at(now_ms))
                .min_by_key(|e| (e.expires_at, e.inserted_seq)),
        };

        match candidate {
            Some(entry) => Victim::Key(entry.key.clone()),
            None => Victim::NoneAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Priority => "priority",
            EvictionPolicy::Ttl => "ttl",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            "priority" => Ok(EvictionPolicy::Priority),
            "ttl" => Ok(EvictionPolicy::Ttl),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown cache strategy type: {}",
                other
            ))),
        }
    }
}

// == Factory ==
/// Resolves a policy name, falling back to LRU for unknown names.
///
/// The fallback is permissive on purpose and always logged.
pub fn create_cache_strategy(kind: &str) -> EvictionPolicy {
    match kind.parse() {
        Ok(policy) => policy,
        Err(_) => {
            warn!("Unknown cache strategy type: {}, falling back to LRU", kind);
            EvictionPolicy::Lru
        }
    }
}
