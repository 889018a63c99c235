//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{CacheLevel, SetOptions, MAX_KEY_LENGTH};

/// Request body for `PUT /cache/:key`
///
/// # Fields
/// - `value`: Any JSON value to store
/// - `ttl`: Optional TTL in seconds (entries never expire without one)
/// - `tags`: Labels for group invalidation
/// - `dependencies`: Keys whose deletion should also delete this entry
/// - `level`: Target tier, `auto` by default
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub level: CacheLevel,
}

impl SetRequest {
    /// Converts the request metadata into write options.
    pub fn options(&self) -> SetOptions {
        SetOptions {
            ttl: self.ttl.map(Duration::from_secs),
            tags: self.tags.clone(),
            dependencies: self.dependencies.clone(),
            level: self.level,
        }
    }
}

/// Validates a key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for `POST /invalidate/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateTagsRequest {
    pub tags: Vec<String>,
}

/// Request body for `POST /invalidate/pattern`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    /// Regular expression matched against every key
    pub pattern: String,
}
