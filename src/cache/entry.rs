//! Cache Entry Module
//!
//! Defines individual cache entries, their metadata and insertion options.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cache::CacheValue;

// == Priority ==
/// Eviction priority of an entry. Lower priorities are evicted first by the
/// priority policy; other policies ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl Priority {
    /// Maps a prefetch probability / resource weight in `[0, 1]` onto a priority.
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 0.9 {
            Priority::High
        } else if weight >= 0.5 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

// == Entry Origin ==
/// Whether an entry was stored because someone asked for it or because the
/// warmer predicted it would be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    #[default]
    Requested,
    Predicted,
}

// == Set Options ==
/// Per-entry overrides for `set`.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Explicit size in bytes; estimated from the value when `None`
    pub size: Option<u64>,
    /// Eviction priority; `Medium` when `None`
    pub priority: Option<Priority>,
    /// TTL in milliseconds; the store default when `None`
    pub ttl_ms: Option<u64>,
    pub origin: EntryOrigin,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    pub fn predicted(mut self) -> Self {
        self.origin = EntryOrigin::Predicted;
        self
    }
}

// == Cache Entry ==
/// A single cache entry with value and metadata.
///
/// Wall-clock timestamps drive expiry. The `*_seq` fields are ticks of the
/// store's logical clock and give policies a strict, deterministic order even
/// when several operations land in the same millisecond.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: CacheValue,
    /// Size in bytes, counted against the store's byte budget
    pub size: u64,
    pub priority: Priority,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read or write (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Successful reads since insertion
    pub hit_count: u64,
    pub origin: EntryOrigin,
    /// Logical insertion tick
    pub inserted_seq: u64,
    /// Logical tick of the last access (insert counts as an access)
    pub accessed_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The entry key
    /// * `value` - The stored payload
    /// * `size` - Size in bytes, already validated by the store
    /// * `ttl_ms` - Time to live in milliseconds
    /// * `seq` - Logical clock tick assigned by the store
    pub fn new(
        key: String,
        value: CacheValue,
        size: u64,
        ttl_ms: u64,
        priority: Priority,
        origin: EntryOrigin,
        seq: u64,
    ) -> Self {
        let now = current_timestamp_ms();

        Self {
            key,
            value,
            size,
            priority,
            created_at: now,
            last_accessed_at: now,
            expires_at: now.saturating_add(ttl_ms),
            hit_count: 0,
            origin,
            inserted_seq: seq,
            accessed_seq: seq,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, seq: u64) {
        self.hit_count += 1;
        self.last_accessed_at = current_timestamp_ms();
        self.accessed_seq = seq;
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn entry(ttl_ms: u64) -> CacheEntry {
        CacheEntry::new(
            "k".to_string(),
            CacheValue::from("v"),
            2,
            ttl_ms,
            Priority::default(),
            EntryOrigin::Requested,
            7,
        )
    }

    #[test]
    fn test_entry_creation() {
        let entry = entry(60_000);

        assert_eq!(entry.value, CacheValue::from("v"));
        assert_eq!(entry.priority, Priority::Medium);
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.inserted_seq, 7);
        assert_eq!(entry.accessed_seq, 7);
        assert_eq!(entry.expires_at, entry.created_at + 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = entry(1);

        sleep(Duration::from_millis(5));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry(0);

        // Expired as soon as now >= expires_at
        assert!(entry.is_expired_at(entry.expires_at));
        assert!(!entry.is_expired_at(entry.expires_at - 1));
    }

    #[test]
    fn test_touch_updates_metadata() {
        let mut entry = entry(60_000);

        entry.touch(42);
        entry.touch(43);

        assert_eq!(entry.hit_count, 2);
        assert_eq!(entry.accessed_seq, 43);
        assert_eq!(entry.inserted_seq, 7);
        assert!(entry.last_accessed_at >= entry.created_at);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::from_weight(0.95), Priority::High);
        assert_eq!(Priority::from_weight(0.7), Priority::Medium);
        assert_eq!(Priority::from_weight(0.1), Priority::Low);
    }

    #[test]
    fn test_set_options_builder() {
        let opts = SetOptions::new()
            .size(10)
            .priority(Priority::High)
            .ttl_ms(5)
            .predicted();

        assert_eq!(opts.size, Some(10));
        assert_eq!(opts.priority, Some(Priority::High));
        assert_eq!(opts.ttl_ms, Some(5));
        assert_eq!(opts.origin, EntryOrigin::Predicted);
    }
}
