//! Cache Entry Module
//!
//! Defines the stored unit: a value plus TTL, access and invalidation metadata.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

// == Cache Value ==
/// Capability required from anything stored in the cache.
///
/// Values are encoded with `serde_json`, which gives both the disk payload
/// and the size used for capacity accounting.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

// == Entry Metadata ==
/// Everything about an entry except its value.
///
/// The disk tier keeps this in its index so existence, expiry, LRU and tag
/// queries never have to read a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read (Unix milliseconds)
    pub last_accessed: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Time to live in milliseconds, None = no expiration
    pub ttl_ms: Option<u64>,
    /// Serialized size of the value in bytes
    pub size_bytes: u64,
    /// Labels for bulk invalidation
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Keys whose deletion also deletes this entry
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl EntryMeta {
    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is strictly past
    /// `created_at + ttl`. At exactly the boundary it is still live.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.ttl_ms {
            Some(ttl) => now_ms > self.created_at.saturating_add(ttl),
            None => false,
        }
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.ttl_ms.map(|ttl| {
            self.created_at
                .saturating_add(ttl)
                .saturating_sub(current_timestamp_ms())
        })
    }

    /// Records a successful read.
    pub fn touch(&mut self) {
        self.last_accessed = current_timestamp_ms();
        self.access_count += 1;
    }

    /// True if any of the given tags is attached to this entry.
    pub fn has_any_tag<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        tags.into_iter().any(|tag| self.tags.contains(tag))
    }
}

// == Cache Entry ==
/// A single cache entry with value and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// Identity of the entry within a backend
    pub key: String,
    /// The stored value
    pub value: V,
    /// Timestamps, counters, size, tags and dependencies
    pub meta: EntryMeta,
}

impl<V: CacheValue> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry, measuring the value's serialized size.
    ///
    /// Fails if the value cannot be encoded; nothing should be stored then.
    pub fn new(
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
        tags: impl IntoIterator<Item = String>,
        dependencies: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let size_bytes = serde_json::to_vec(&value)?.len() as u64;
        let now = current_timestamp_ms();

        Ok(Self {
            key: key.into(),
            value,
            meta: EntryMeta {
                created_at: now,
                last_accessed: now,
                access_count: 0,
                ttl_ms: ttl.map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
                size_bytes,
                tags: tags.into_iter().collect(),
                dependencies: dependencies.into_iter().collect(),
            },
        })
    }

    /// Shorthand for an untagged entry.
    pub fn simple(key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<Self> {
        Self::new(key, value, ttl, [], [])
    }

    /// Checks if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.meta.is_expired()
    }

    /// Size used for capacity accounting.
    pub fn size_bytes(&self) -> u64 {
        self.meta.size_bytes
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

/// Hex-encoded SHA-256 of the input.
pub fn digest_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}
