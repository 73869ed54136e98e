//! Cache Value Module
//!
//! Opaque payloads stored in the cache and their size estimation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// == Cache Value ==
/// A cached payload.
///
/// The cache never looks inside a value except to estimate its size when the
/// caller did not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CacheValue {
    /// Text payload
    Text(String),
    /// Raw binary payload (fetched resources, re-encoded images)
    Bytes(Bytes),
    /// Structured payload
    Json(serde_json::Value),
}

impl CacheValue {
    // == Size Estimation ==
    /// Approximates the in-memory footprint of the value in bytes.
    ///
    /// - text: 2 bytes per character
    /// - binary: byte length
    /// - structured: serialized length, 2 bytes per character
    pub fn estimated_size(&self) -> u64 {
        match self {
            CacheValue::Text(s) => s.chars().count() as u64 * 2,
            CacheValue::Bytes(b) => b.len() as u64,
            CacheValue::Json(v) => serde_json::to_string(v)
                .map(|s| s.chars().count() as u64 * 2)
                .unwrap_or(0),
        }
    }

    /// Returns the text content if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the binary content if this is a binary value.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            CacheValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<Bytes> for CacheValue {
    fn from(value: Bytes) -> Self {
        CacheValue::Bytes(value)
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(Bytes::from(value))
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(value: serde_json::Value) -> Self {
        CacheValue::Json(value)
    }
}
