//! Cache Statistics Module
//!
//! Tracks lookup outcomes across tiers and snapshots them with tier sizes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Tier Counters ==
/// Lock-free lookup counters shared by all callers of a multi-tier cache.
#[derive(Debug, Default)]
pub struct TierCounters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    promotions: AtomicU64,
}

impl TierCounters {
    /// Creates counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        self.memory_hits.store(0, Ordering::Relaxed);
        self.disk_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.promotions.store(0, Ordering::Relaxed);
    }

    /// Copies the counters into a snapshot with empty tier figures.
    pub fn snapshot(&self) -> CacheStats {
        let mut stats = CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        stats.refresh_derived();
        stats
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered by the memory tier
    pub memory_hits: u64,
    /// Lookups answered by the disk tier
    pub disk_hits: u64,
    /// Lookups answered by neither tier
    pub misses: u64,
    /// Disk entries copied into memory
    pub promotions: u64,
    /// Total lookups
    pub total_requests: u64,
    /// Hits as a percentage of lookups, 0 when there were none
    pub hit_rate_percent: f64,
    /// Bytes tracked by the memory tier
    pub memory_bytes: u64,
    /// Bytes tracked by the disk tier
    pub disk_bytes: u64,
    /// Entries in the memory tier
    pub memory_entry_count: usize,
    /// Entries in the disk tier
    pub disk_entry_count: usize,
    /// Entries evicted from memory for space
    pub memory_evictions: u64,
    /// Entries evicted from disk for space
    pub disk_evictions: u64,
}

impl CacheStats {
    /// Hits from either tier.
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate as a fraction.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    fn refresh_derived(&mut self) {
        self.total_requests = self.hits() + self.misses;
        self.hit_rate_percent = self.hit_rate() * 100.0;
    }
}
