//! Cache Module
//!
//! Two-tier caching: a byte-bounded LRU memory tier in front of a persistent
//! disk tier, composed by [`MultiTierCache`] and exposed through [`CacheManager`].

mod backend;
mod compression;
mod dependencies;
mod disk;
mod entry;
mod lru;
mod manager;
mod memory;
mod stats;
mod tiered;


// Re-export public types
pub use backend::CacheBackend;
pub use compression::{CompressionAlgorithm, PayloadCodec};
pub use dependencies::{prune_dependencies, DependencyGraph};
pub use disk::{DiskBackend, DiskConfig};
pub use entry::{current_timestamp_ms, CacheEntry, CacheValue, EntryMeta};
pub use lru::LruIndex;
pub use manager::CacheManager;
pub use memory::MemoryBackend;
pub use stats::{CacheStats, TierCounters};
pub use tiered::{CacheLevel, MultiTierCache, SetOptions};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
