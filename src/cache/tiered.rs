//! Multi-Tier Cache
//!
//! Composes the memory and disk backends: reads fall through memory to disk,
//! hot disk entries are promoted, and writes pick a tier by size or request.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::CacheBackend;
use super::disk::{DiskBackend, DiskConfig};
use super::entry::{CacheEntry, CacheValue};
use super::memory::MemoryBackend;
use super::stats::{CacheStats, TierCounters};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache Level ==
/// Which tier a write goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheLevel {
    /// Memory tier only
    Memory,
    /// Disk tier only
    Disk,
    /// Memory for small entries, disk for large ones
    #[default]
    Auto,
}

// == Set Options ==
/// Optional metadata attached to a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub level: CacheLevel,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl_secs(self, seconds: u64) -> Self {
        self.ttl(Duration::from_secs(seconds))
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn level(mut self, level: CacheLevel) -> Self {
        self.level = level;
        self
    }
}

// == Multi-Tier Cache ==
/// Memory tier in front of a disk tier.
///
/// Promotion copies a disk entry into memory and leaves the disk copy in
/// place. The two steps take the two tier locks one after the other, so a
/// key may briefly be visible in both tiers with equal values.
pub struct MultiTierCache<V> {
    memory: MemoryBackend<V>,
    disk: DiskBackend<V>,
    counters: TierCounters,
    promotion_threshold: u64,
    memory_entry_limit: u64,
}

impl<V: CacheValue> MultiTierCache<V> {
    // == Constructor ==
    /// Composes existing backends.
    ///
    /// # Arguments
    /// * `promotion_threshold` - disk hits whose access count exceeds this are promoted
    /// * `memory_entry_limit` - `Auto` writes below this many bytes go to memory
    pub fn new(
        memory: MemoryBackend<V>,
        disk: DiskBackend<V>,
        promotion_threshold: u64,
        memory_entry_limit: u64,
    ) -> Self {
        Self {
            memory,
            disk,
            counters: TierCounters::new(),
            promotion_threshold,
            memory_entry_limit,
        }
    }

    /// Builds both tiers from configuration, opening the disk directory.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        let disk = DiskBackend::open(DiskConfig::from(config))?;
        Ok(Self::new(
            MemoryBackend::new(config.memory_capacity),
            disk,
            config.promotion_threshold,
            config.memory_entry_limit,
        ))
    }

    pub fn memory(&self) -> &MemoryBackend<V> {
        &self.memory
    }

    pub fn disk(&self) -> &DiskBackend<V> {
        &self.disk
    }

    fn tiers(&self) -> [&dyn CacheBackend<V>; 2] {
        [&self.memory, &self.disk]
    }

    // == Get ==
    /// Retrieves a value, checking memory first.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Retrieves the whole entry, checking memory first.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        if let Some(entry) = self.memory.get(key) {
            self.counters.record_memory_hit();
            debug!(key, "memory hit");
            return Some(entry);
        }

        let Some(entry) = self.disk.get(key) else {
            self.counters.record_miss();
            debug!(key, "miss");
            return None;
        };

        self.counters.record_disk_hit();
        debug!(key, access_count = entry.meta.access_count, "disk hit");

        if entry.meta.access_count > self.promotion_threshold
            && self.memory.set(key, entry.clone())
        {
            self.counters.record_promotion();
            debug!(key, "promoted to memory");
        }
        Some(entry)
    }

    // == Set ==
    /// Stores a value in the tier chosen by `options.level`.
    ///
    /// Returns false if the value cannot be serialized or the tier rejects
    /// it. Any copy in the other tier is removed so it cannot be served stale;
    /// a failed write removes the key from both tiers.
    pub fn set(&self, key: &str, value: V, options: SetOptions) -> bool {
        let entry = match CacheEntry::new(
            key,
            value,
            options.ttl,
            options.tags,
            options.dependencies,
        ) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "value could not be serialized");
                return false;
            }
        };

        let [memory, disk] = self.tiers();
        let (target, other) = match self.resolve_level(options.level, entry.size_bytes()) {
            CacheLevel::Memory => (memory, disk),
            _ => (disk, memory),
        };

        let stored = target.set(key, entry);
        if stored {
            other.delete(key);
            debug!(key, tier = target.name(), "stored");
        } else {
            memory.delete(key);
            disk.delete(key);
        }
        stored
    }

    fn resolve_level(&self, requested: CacheLevel, size: u64) -> CacheLevel {
        match requested {
            CacheLevel::Auto if size < self.memory_entry_limit => CacheLevel::Memory,
            CacheLevel::Auto => CacheLevel::Disk,
            explicit => explicit,
        }
    }

    // == Delete ==
    /// Removes `key` from both tiers. True if either held it.
    pub fn delete(&self, key: &str) -> bool {
        let from_memory = self.memory.delete(key);
        let from_disk = self.disk.delete(key);
        from_memory || from_disk
    }

    /// Removes every entry carrying any of `tags`, returning how many keys were removed.
    pub fn invalidate_by_tags(&self, tags: &[String]) -> usize {
        if tags.is_empty() {
            return 0;
        }

        let mut removed = HashSet::new();
        for tier in self.tiers() {
            for key in tier.keys() {
                let tagged = tier.metadata(&key).is_some_and(|meta| meta.has_any_tag(tags));
                if tagged && tier.delete(&key) {
                    removed.insert(key);
                }
            }
        }
        debug!(?tags, removed = removed.len(), "invalidated by tags");
        removed.len()
    }

    /// True if either tier tracks `key`, without counting a lookup.
    pub fn contains(&self, key: &str) -> bool {
        self.tiers().iter().any(|tier| tier.metadata(key).is_some())
    }

    /// Union of both tiers' keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.tiers()
            .iter()
            .flat_map(|tier| tier.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Empties both tiers. Lookup counters are kept.
    pub fn clear(&self) -> bool {
        let memory = self.memory.clear();
        let disk = self.disk.clear();
        memory && disk
    }

    /// Deletes expired entries from both tiers.
    pub fn purge_expired(&self) -> usize {
        self.tiers().iter().map(|tier| tier.purge_expired()).sum()
    }

    // == Stats ==
    /// Returns lookup counters plus current tier occupancy.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.counters.snapshot();
        stats.memory_bytes = self.memory.size();
        stats.disk_bytes = self.disk.size();
        stats.memory_entry_count = self.memory.len();
        stats.disk_entry_count = self.disk.len();
        stats.memory_evictions = self.memory.evictions();
        stats.disk_evictions = self.disk.evictions();
        stats
    }

    /// Zeroes the lookup counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}
