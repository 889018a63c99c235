//! Memory Backend
//!
//! Bounded in-process tier: HashMap storage with LRU eviction by byte size.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::backend::CacheBackend;
use super::entry::{CacheEntry, CacheValue, EntryMeta};
use super::lru::LruIndex;

#[derive(Debug)]
struct MemoryState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruIndex,
    used_bytes: u64,
}

impl<V> MemoryState<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.used_bytes = self.used_bytes.saturating_sub(entry.meta.size_bytes);
        Some(entry)
    }
}

// == Memory Backend ==
/// In-memory tier bounded by total entry bytes.
///
/// Every operation holds one lock for the whole backend; this tier is
/// memory-speed so serializing it is cheap.
#[derive(Debug)]
pub struct MemoryBackend<V> {
    state: Mutex<MemoryState<V>>,
    capacity: u64,
    evictions: AtomicU64,
}

impl<V: CacheValue> MemoryBackend<V> {
    // == Constructor ==
    /// Creates an empty backend holding at most `capacity` bytes.
    pub fn new(capacity: u64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                entries: HashMap::new(),
                lru: LruIndex::new(),
                used_bytes: 0,
            }),
            capacity,
            evictions: AtomicU64::new(0),
        }
    }

    /// Configured byte capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of entries evicted for space so far.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl<V: CacheValue> CacheBackend<V> for MemoryBackend<V> {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let mut state = self.state.lock();

        if state.entries.get(key)?.is_expired() {
            state.remove(key);
            debug!(key, "memory entry expired");
            return None;
        }

        state.lru.touch(key);
        let entry = state.entries.get_mut(key)?;
        entry.meta.touch();
        Some(entry.clone())
    }

    fn set(&self, key: &str, mut entry: CacheEntry<V>) -> bool {
        let size = entry.meta.size_bytes;
        if size > self.capacity {
            warn!(
                key,
                size,
                capacity = self.capacity,
                "entry larger than memory capacity, rejected"
            );
            return false;
        }

        let mut state = self.state.lock();
        state.remove(key);

        // Make room before inserting
        while state.used_bytes + size > self.capacity {
            let Some(victim) = state.lru.evict_oldest() else {
                break;
            };
            if let Some(evicted) = state.entries.remove(&victim) {
                state.used_bytes = state.used_bytes.saturating_sub(evicted.meta.size_bytes);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %victim, size = evicted.meta.size_bytes, "evicted from memory");
            }
        }

        entry.key = key.to_string();
        state.used_bytes += size;
        state.lru.touch(key);
        state.entries.insert(key.to_string(), entry);
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.state.lock().remove(key).is_some()
    }

    fn clear(&self) -> bool {
        let mut state = self.state.lock();
        state.entries.clear();
        state.lru.clear();
        state.used_bytes = 0;
        true
    }

    fn keys(&self) -> Vec<String> {
        self.state.lock().entries.keys().cloned().collect()
    }

    fn size(&self) -> u64 {
        self.state.lock().used_bytes
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn metadata(&self, key: &str) -> Option<EntryMeta> {
        self.state.lock().entries.get(key).map(|e| e.meta.clone())
    }

    fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove(key);
        }
        expired.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn entry(key: &str, value: &str) -> CacheEntry<String> {
        CacheEntry::simple(key, value.to_string(), None).unwrap()
    }

    /// Every value of this length encodes to exactly 10 bytes.
    fn ten_byte(key: &str) -> CacheEntry<String> {
        entry(key, "abcdefgh")
    }

    #[test]
    fn test_set_and_get() {
        let backend = MemoryBackend::new(1024);

        assert!(backend.set("key1", entry("key1", "value1")));
        let got = backend.get("key1").unwrap();

        assert_eq!(got.value, "value1");
        assert_eq!(got.meta.access_count, 1);
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.size(), 8);
    }

    #[test]
    fn test_get_nonexistent() {
        let backend: MemoryBackend<String> = MemoryBackend::new(1024);
        assert!(backend.get("nonexistent").is_none());
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let backend = MemoryBackend::new(1024);

        backend.set("key1", entry("key1", "short"));
        backend.set("key1", entry("key1", "a much longer value"));

        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("key1").unwrap().value, "a much longer value");
        assert_eq!(backend.size(), 21);
    }

    #[test]
    fn test_write_does_not_touch_access_count() {
        let backend = MemoryBackend::new(1024);
        backend.set("key1", entry("key1", "v"));

        assert_eq!(backend.metadata("key1").unwrap().access_count, 0);
        backend.get("key1");
        assert_eq!(backend.metadata("key1").unwrap().access_count, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new(1024);
        backend.set("key1", entry("key1", "v"));

        assert!(backend.delete("key1"));
        assert!(!backend.delete("key1"));
        assert_eq!(backend.size(), 0);
    }

    #[test]
    fn test_clear_twice() {
        let backend = MemoryBackend::new(1024);
        backend.set("a", entry("a", "1"));
        backend.set("b", entry("b", "2"));

        assert!(backend.clear());
        assert!(backend.is_empty());
        assert!(backend.clear());
        assert!(backend.keys().is_empty());
    }

    #[test]
    fn test_ttl_expiration() {
        let backend = MemoryBackend::new(1024);
        let e = CacheEntry::simple("k", "v".to_string(), Some(Duration::from_millis(50))).unwrap();
        backend.set("k", e);

        assert!(backend.get("k").is_some());
        sleep(Duration::from_millis(80));

        assert!(backend.get("k").is_none());
        assert_eq!(backend.len(), 0);
        assert_eq!(backend.size(), 0);
    }

    #[test]
    fn test_lru_eviction_by_bytes() {
        let backend = MemoryBackend::new(30);

        backend.set("key1", ten_byte("key1"));
        backend.set("key2", ten_byte("key2"));
        backend.set("key3", ten_byte("key3"));
        assert_eq!(backend.size(), 30);

        // Full: key4 pushes out key1
        backend.set("key4", ten_byte("key4"));

        assert_eq!(backend.len(), 3);
        assert!(backend.get("key1").is_none());
        assert!(backend.get("key2").is_some());
        assert_eq!(backend.evictions(), 1);
    }

    #[test]
    fn test_lru_touch_on_get() {
        let backend = MemoryBackend::new(30);

        backend.set("key1", ten_byte("key1"));
        backend.set("key2", ten_byte("key2"));
        backend.set("key3", ten_byte("key3"));

        backend.get("key1");
        backend.set("key4", ten_byte("key4"));

        assert!(backend.get("key1").is_some());
        assert!(backend.get("key2").is_none());
    }

    #[test]
    fn test_large_insert_evicts_several() {
        let backend = MemoryBackend::new(30);
        backend.set("a", ten_byte("a"));
        backend.set("b", ten_byte("b"));
        backend.set("c", ten_byte("c"));

        // 20 bytes needs two victims
        backend.set("big", entry("big", "123456789012345678"));

        assert!(backend.metadata("a").is_none());
        assert!(backend.metadata("b").is_none());
        assert!(backend.metadata("c").is_some());
        assert!(backend.size() <= 30);
        assert_eq!(backend.evictions(), 2);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let backend = MemoryBackend::new(30);
        backend.set("a", ten_byte("a"));

        let huge = entry("huge", &"x".repeat(64));
        assert!(!backend.set("huge", huge));

        // Nothing was evicted for it
        assert!(backend.metadata("a").is_some());
        assert_eq!(backend.evictions(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let backend = MemoryBackend::new(1024);
        let short =
            CacheEntry::simple("short", "v".to_string(), Some(Duration::from_millis(30))).unwrap();
        backend.set("short", short);
        backend.set("long", entry("long", "v"));

        sleep(Duration::from_millis(60));

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.keys(), vec!["long".to_string()]);
    }
}
