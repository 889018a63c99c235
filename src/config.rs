//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default memory tier capacity (100 MB)
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100 * 1024 * 1024;

/// Default disk tier capacity (1 GB)
pub const DEFAULT_DISK_CAPACITY: u64 = 1024 * 1024 * 1024;

/// Entries below this serialized size go to memory when the level is `Auto` (100 KB)
pub const DEFAULT_MEMORY_ENTRY_LIMIT: u64 = 100 * 1024;

/// Cache tuning parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory of the disk tier
    pub cache_dir: PathBuf,
    /// Byte capacity of the memory tier
    pub memory_capacity: u64,
    /// Byte capacity of the disk tier
    pub disk_capacity: u64,
    /// Disk hits with an access count above this are copied into memory
    pub promotion_threshold: u64,
    /// Size limit for automatic placement in the memory tier
    pub memory_entry_limit: u64,
    /// TTL in seconds used by cache warming
    pub default_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Hit rate (percent) below which the cleanup task logs a warning
    pub hit_rate_alert_percent: f64,
    /// Minimum lookups before the hit rate is evaluated
    pub hit_rate_min_requests: u64,
    /// Compress disk payloads with LZ4
    pub disk_compression: bool,
    /// Payloads smaller than this are stored uncompressed
    pub compression_min_bytes: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk tier directory (default: ./cache_data)
    /// - `MEMORY_CAPACITY_BYTES` - Memory tier capacity (default: 100 MB)
    /// - `DISK_CAPACITY_BYTES` - Disk tier capacity (default: 1 GB)
    /// - `PROMOTION_THRESHOLD` - Disk reads before promotion (default: 5)
    /// - `MEMORY_ENTRY_LIMIT_BYTES` - Auto placement limit (default: 100 KB)
    /// - `DEFAULT_TTL` - Warm-up TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 300)
    /// - `HIT_RATE_ALERT_PERCENT` - Low hit rate threshold (default: 50)
    /// - `HIT_RATE_MIN_REQUESTS` - Lookups before alerting (default: 100)
    /// - `DISK_COMPRESSION` - Enable LZ4 on disk (default: true)
    /// - `COMPRESSION_MIN_BYTES` - Compression threshold (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            memory_capacity: env_or("MEMORY_CAPACITY_BYTES", defaults.memory_capacity),
            disk_capacity: env_or("DISK_CAPACITY_BYTES", defaults.disk_capacity),
            promotion_threshold: env_or("PROMOTION_THRESHOLD", defaults.promotion_threshold),
            memory_entry_limit: env_or("MEMORY_ENTRY_LIMIT_BYTES", defaults.memory_entry_limit),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            hit_rate_alert_percent: env_or(
                "HIT_RATE_ALERT_PERCENT",
                defaults.hit_rate_alert_percent,
            ),
            hit_rate_min_requests: env_or("HIT_RATE_MIN_REQUESTS", defaults.hit_rate_min_requests),
            disk_compression: env_or("DISK_COMPRESSION", defaults.disk_compression),
            compression_min_bytes: env_or("COMPRESSION_MIN_BYTES", defaults.compression_min_bytes),
        }
    }

    /// Returns a copy rooted at a different disk directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache_data"),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            disk_capacity: DEFAULT_DISK_CAPACITY,
            promotion_threshold: 5,
            memory_entry_limit: DEFAULT_MEMORY_ENTRY_LIMIT,
            default_ttl: 3600,
            cleanup_interval: 300,
            hit_rate_alert_percent: 50.0,
            hit_rate_min_requests: 100,
            disk_compression: true,
            compression_min_bytes: 1024,
        }
    }
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache parameters
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// `SERVER_PORT` (default: 3000) plus everything read by [`CacheConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 3000),
            cache: CacheConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache: CacheConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
