//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{CacheValue, Priority, SetOptions, MAX_KEY_LENGTH};
use crate::optimizer::{Resource, ResourceKind};

/// Request body for the SET operation (PUT /cache)
///
/// A JSON string is stored as text; any other JSON value is stored as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: serde_json::Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    /// Optional eviction priority: low, medium or high
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Optional size in bytes; estimated from the value when absent
    #[serde(default)]
    pub size: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl_ms == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }

    pub fn into_parts(self) -> (String, CacheValue, SetOptions) {
        let value = match self.value {
            serde_json::Value::String(text) => CacheValue::Text(text),
            other => CacheValue::Json(other),
        };
        let opts = SetOptions {
            size: self.size,
            priority: self.priority,
            ttl_ms: self.ttl_ms,
            ..SetOptions::default()
        };
        (self.key, value, opts)
    }
}

/// Request body for POST /prefetch
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchRequest {
    /// Resource id, also its cache key
    pub id: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    /// Relative importance in `[0, 1]`
    #[serde(default)]
    pub priority: Option<f64>,
}

impl PrefetchRequest {
    pub fn validate(&self) -> Option<String> {
        if self.id.is_empty() {
            return Some("Resource id cannot be empty".to_string());
        }
        if self.url.is_empty() {
            return Some("Resource url cannot be empty".to_string());
        }
        if let Some(priority) = self.priority {
            if !(0.0..=1.0).contains(&priority) {
                return Some("Priority must be between 0 and 1".to_string());
            }
        }
        None
    }

    pub fn into_resource(self) -> Resource {
        let resource = Resource::new(self.id, self.url, self.kind);
        match self.priority {
            Some(priority) => resource.with_priority(priority),
            None => resource,
        }
    }
}
