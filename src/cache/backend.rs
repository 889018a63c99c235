//! Backend Contract
//!
//! The capability set both storage tiers implement.

use super::entry::{CacheEntry, EntryMeta};

/// One storage tier.
///
/// Implementations never surface errors: failures are logged and reported as
/// a miss (`None`) or a rejected write (`false`). A backend may forget a
/// value but must never return one it does not have.
pub trait CacheBackend<V>: Send + Sync {
    /// Short tier name used in log lines.
    fn name(&self) -> &'static str;

    /// Returns the live entry for `key`, recording the access.
    ///
    /// Expired or unreadable entries are deleted and reported as absent.
    fn get(&self, key: &str) -> Option<CacheEntry<V>>;

    /// Stores `entry` under `key`, replacing any previous entry.
    ///
    /// Evicts least recently used entries first when needed. Returns false
    /// if the entry cannot be stored, including when it alone exceeds the
    /// tier's capacity.
    fn set(&self, key: &str, entry: CacheEntry<V>) -> bool;

    /// Removes `key`. True if something was removed.
    fn delete(&self, key: &str) -> bool;

    /// Removes every entry.
    fn clear(&self) -> bool;

    /// Snapshot of tracked keys, possibly including entries that will be
    /// found expired on their next read.
    fn keys(&self) -> Vec<String>;

    /// Total tracked bytes.
    fn size(&self) -> u64;

    /// Number of tracked entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata for `key` without counting an access.
    fn metadata(&self, key: &str) -> Option<EntryMeta>;

    /// Deletes every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;
}
