//! Cache Store Module
//!
//! Main cache engine: a bounded key→entry map with byte-size accounting, TTL
//! expiration and pluggable victim selection.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{
    CacheEntry, CacheStats, CacheValue, EvictionPolicy, SetOptions, Victim, MAX_KEY_LENGTH,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Bounded cache storage.
///
/// Invariants held after every operation:
/// - the sum of entry sizes never exceeds `max_size`
/// - the number of entries never exceeds `max_entries`
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Victim selection strategy
    policy: EvictionPolicy,
    /// Performance statistics
    stats: CacheStats,
    /// Bytes accounted to live entries
    current_size: u64,
    /// Byte budget
    max_size: u64,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl_ms: u64,
    /// Logical clock, advanced on every insert and hit
    clock: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_size` - Byte budget for all entries
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl_ms` - TTL for entries stored without an explicit one
    /// * `policy` - Victim selection strategy
    pub fn new(
        max_size: u64,
        max_entries: usize,
        default_ttl_ms: u64,
        policy: EvictionPolicy,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            stats: CacheStats::new(),
            current_size: 0,
            max_size,
            max_entries,
            default_ttl_ms,
            clock: 0,
        }
    }

    /// Creates a store sized and configured from `Config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_size_bytes,
            config.max_entries,
            config.default_ttl_ms,
            config.eviction_policy,
        )
    }

    // == Set ==
    /// Stores a value under `key`.
    ///
    /// The size is taken from `opts.size` or estimated from the value. An entry
    /// larger than the whole byte budget is rejected with `EntryTooLarge` and
    /// the store is left untouched. Otherwise an existing entry for the key is
    /// replaced and victims are evicted until the new entry fits.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        opts: SetOptions,
    ) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let size = opts.size.unwrap_or_else(|| value.estimated_size());
        if size > self.max_size {
            return Err(CacheError::EntryTooLarge {
                key,
                size,
                max: self.max_size,
            });
        }
        if self.max_entries == 0 {
            return Err(CacheError::CacheFull(
                "Cache is configured with zero capacity".to_string(),
            ));
        }

        // Overwrite: release the old entry before making room
        if let Some(old) = self.entries.remove(&key) {
            self.current_size -= old.size;
        }

        self.make_room(size)?;

        let seq = self.next_seq();
        let entry = CacheEntry::new(
            key.clone(),
            value,
            size,
            opts.ttl_ms.unwrap_or(self.default_ttl_ms),
            opts.priority.unwrap_or_default(),
            opts.origin,
            seq,
        );
        self.entries.insert(key, entry);
        self.current_size += size;

        Ok(())
    }

    // == Make Room ==
    /// Evicts until `incoming` more bytes and one more entry fit.
    fn make_room(&mut self, incoming: u64) -> Result<()> {
        let now = current_timestamp_ms();

        while self.needs_room(incoming) {
            let victim = match self.policy.select_victim(&self.entries, now) {
                Victim::Key(key) => key,
                // TTL policy with nothing expired: force progress in insertion order
                Victim::NoneAvailable => match EvictionPolicy::Fifo.select_victim(&self.entries, now) {
                    Victim::Key(key) => {
                        debug!("No expired entry under {} policy, forcing FIFO eviction", self.policy);
                        key
                    }
                    _ => break,
                },
                Victim::Empty => break,
            };

            if let Some(evicted) = self.entries.remove(&victim) {
                self.current_size -= evicted.size;
                self.stats.record_eviction();
                debug!("Evicted '{}' ({} bytes) under {} policy", victim, evicted.size, self.policy);
            }
        }

        if self.needs_room(incoming) {
            return Err(CacheError::CacheFull(
                "Cache is full and eviction failed".to_string(),
            ));
        }
        Ok(())
    }

    fn needs_room(&self, incoming: u64) -> bool {
        self.current_size + incoming > self.max_size || self.entries.len() >= self.max_entries
    }

    fn next_seq(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// This is a mutating read: a hit updates the entry's access metadata, and
    /// an entry found past its expiry is deleted and reported as `Expired`.
    pub fn get(&mut self, key: &str) -> Result<CacheValue> {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expired(1);
            self.stats.record_miss();
            return Err(CacheError::Expired(key.to_string()));
        }

        let seq = self.next_seq();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(seq);
                self.stats.record_hit();
                Ok(entry.value.clone())
            }
            None => Err(CacheError::Internal(format!("Entry vanished during read: {}", key))),
        }
    }

    // == Delete ==
    /// Removes an entry by key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.remove_entry(key).is_some() {
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.current_size -= entry.size;
        Some(entry)
    }

    // == Clear ==
    /// Removes every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
        self.stats = CacheStats::new();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.entries.len(), self.current_size);
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expired(expired_keys.len());
        expired_keys.len()
    }

    // == Inspection ==
    /// True when a live (non-expired) entry exists. Not counted as an access.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Metadata peek for diagnostics. Not counted as an access.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size_bytes(&self) -> u64 {
        self.current_size
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Switches the eviction policy. Entry metadata is policy-agnostic, so no
    /// migration is needed.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        self.policy = policy;
    }
}
