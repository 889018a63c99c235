//! Disk Backend
//!
//! Persistent tier: one payload file per key plus a JSON index of metadata.
//!
//! # Layout
//!
//! - `<sha256(key)>.entry` - encoded `CacheEntry`, see [`PayloadCodec`]
//! - `index.json` - per-key metadata, the source of truth for existence
//!
//! Payloads are written (temp file + rename) before the index names them and
//! the whole index is rewritten the same way after every mutation, so the
//! index on disk only ever refers to fully written payloads.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::CacheBackend;
use super::compression::PayloadCodec;
use super::entry::{digest_hex, CacheEntry, CacheValue, EntryMeta};
use crate::config::{CacheConfig, DEFAULT_DISK_CAPACITY};
use crate::error::{CacheError, Result};

const INDEX_FILE: &str = "index.json";
const INDEX_VERSION: u32 = 2;
const PAYLOAD_EXT: &str = "entry";
const TMP_EXT: &str = "tmp";

/// Disk tier configuration
#[derive(Debug, Clone)]
pub struct DiskConfig {
    /// Cache directory path
    pub directory: PathBuf,
    /// Maximum stored bytes
    pub capacity: u64,
    /// Compress payloads with LZ4
    pub compression: bool,
    /// Smaller payloads are stored uncompressed
    pub compression_min_bytes: usize,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./cache_data"),
            capacity: DEFAULT_DISK_CAPACITY,
            compression: true,
            compression_min_bytes: 1024,
        }
    }
}

impl From<&CacheConfig> for DiskConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            directory: config.cache_dir.clone(),
            capacity: config.disk_capacity,
            compression: config.disk_compression,
            compression_min_bytes: config.compression_min_bytes,
        }
    }
}

/// Index entry for one key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    /// Payload file name inside the cache directory
    file: String,
    /// Bytes the payload occupies on disk
    stored_bytes: u64,
    /// Length of the encoded entry before compression
    raw_bytes: u64,
    /// Access sequence number, breaks ties in `last_accessed`
    seq: u64,
    meta: EntryMeta,
}

/// Persisted form of the index
#[derive(Debug, Serialize, Deserialize)]
struct DiskIndex {
    version: u32,
    next_seq: u64,
    entries: BTreeMap<String, IndexRecord>,
}

impl Default for DiskIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            next_seq: 0,
            entries: BTreeMap::new(),
        }
    }
}

impl DiskIndex {
    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Least recently accessed key.
    fn lru_victim(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, record)| (record.meta.last_accessed, record.seq))
            .map(|(key, _)| key.clone())
    }
}

#[derive(Debug)]
struct DiskState {
    index: DiskIndex,
    used_bytes: u64,
}

// == Disk Backend ==
/// Disk tier bounded by total payload bytes.
///
/// One lock serializes every operation, including the file I/O it performs.
pub struct DiskBackend<V> {
    directory: PathBuf,
    capacity: u64,
    codec: PayloadCodec,
    state: Mutex<DiskState>,
    evictions: AtomicU64,
    _value: PhantomData<fn() -> V>,
}

impl<V: CacheValue> DiskBackend<V> {
    /// Opens (or creates) the cache directory and recovers its index.
    ///
    /// An unreadable index is discarded and the cache starts empty. Index
    /// records whose payload is gone are dropped, and payload or temp files
    /// the index does not name are deleted.
    pub fn open(config: DiskConfig) -> Result<Self> {
        fs::create_dir_all(&config.directory)?;

        let backend = Self {
            codec: PayloadCodec::new(config.compression, config.compression_min_bytes),
            capacity: config.capacity,
            state: Mutex::new(DiskState {
                index: DiskIndex::default(),
                used_bytes: 0,
            }),
            evictions: AtomicU64::new(0),
            directory: config.directory,
            _value: PhantomData,
        };
        backend.recover()?;
        Ok(backend)
    }

    /// Configured byte capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of entries evicted for space so far.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the payload file that holds `key`.
    pub fn payload_path(&self, key: &str) -> PathBuf {
        self.directory.join(payload_file_name(key))
    }

    fn recover(&self) -> Result<()> {
        let mut index = self.load_index()?;

        let before = index.entries.len();
        index
            .entries
            .retain(|_, record| self.directory.join(&record.file).is_file());
        let missing = before - index.entries.len();

        let referenced: HashSet<&str> = index.entries.values().map(|r| r.file.as_str()).collect();
        let orphans = self.sweep_unreferenced(&referenced)?;

        let mut state = self.state.lock();
        state.used_bytes = index.entries.values().map(|r| r.stored_bytes).sum();
        state.index = index;

        let evicted = self.evict_for(&mut state, 0);

        if missing > 0 || orphans > 0 || evicted > 0 {
            info!(
                missing,
                orphans,
                evicted,
                "disk cache recovered with repairs"
            );
            self.persist_index(&state.index)?;
        }
        info!(
            entries = state.index.entries.len(),
            bytes = state.used_bytes,
            dir = %self.directory.display(),
            "disk cache opened"
        );
        Ok(())
    }

    fn load_index(&self) -> Result<DiskIndex> {
        let path = self.directory.join(INDEX_FILE);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DiskIndex::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<DiskIndex>(&raw) {
            Ok(index) if index.version == INDEX_VERSION => Ok(index),
            Ok(index) => {
                warn!(version = index.version, "unsupported disk index version, starting empty");
                Ok(DiskIndex::default())
            }
            Err(e) => {
                warn!(error = %e, "disk index unreadable, starting empty");
                Ok(DiskIndex::default())
            }
        }
    }

    /// Deletes payload and temp files not named by the index.
    fn sweep_unreferenced(&self, referenced: &HashSet<&str>) -> Result<usize> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let stray = match path.extension().and_then(|e| e.to_str()) {
                Some(TMP_EXT) => true,
                Some(PAYLOAD_EXT) => !referenced.contains(name),
                _ => false,
            };
            if stray && remove_file_quiet(&path) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn persist_index(&self, index: &DiskIndex) -> Result<()> {
        let json = serde_json::to_vec(index)?;
        write_atomic(&self.directory.join(INDEX_FILE), &json)?;
        Ok(())
    }

    fn persist_or_warn(&self, index: &DiskIndex) {
        if let Err(e) = self.persist_index(index) {
            warn!(error = %e, "failed to persist disk index");
        }
    }

    /// Drops the record and payload for `key`. Does not persist the index.
    fn remove_record(&self, state: &mut DiskState, key: &str) -> Option<IndexRecord> {
        let record = state.index.entries.remove(key)?;
        state.used_bytes = state.used_bytes.saturating_sub(record.stored_bytes);
        remove_file_quiet(&self.directory.join(&record.file));
        Some(record)
    }

    /// Evicts least recently accessed entries until `incoming` more bytes fit.
    fn evict_for(&self, state: &mut DiskState, incoming: u64) -> usize {
        let mut evicted = 0;
        while state.used_bytes + incoming > self.capacity {
            let Some(victim) = state.index.lru_victim() else {
                break;
            };
            if let Some(record) = self.remove_record(state, &victim) {
                evicted += 1;
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %victim, size = record.stored_bytes, "evicted from disk");
            }
        }
        evicted
    }

    fn read_payload(&self, key: &str, record: &IndexRecord) -> Result<CacheEntry<V>> {
        let payload = fs::read(self.directory.join(&record.file))?;
        let expected = usize::try_from(record.raw_bytes).map_err(|_| {
            CacheError::Corrupted(format!("raw size {} too large", record.raw_bytes))
        })?;
        let raw = self.codec.decode(&payload, expected)?;
        let entry: CacheEntry<V> = serde_json::from_slice(&raw)?;
        if entry.key != key {
            return Err(CacheError::Corrupted(format!(
                "payload holds '{}' instead of '{}'",
                entry.key, key
            )));
        }
        Ok(entry)
    }

    fn try_set(&self, key: &str, entry: &CacheEntry<V>) -> Result<u64> {
        let raw = serde_json::to_vec(entry)?;
        let raw_bytes = raw.len() as u64;
        let payload = self.codec.encode(&raw);
        let stored_bytes = payload.len() as u64;
        if stored_bytes > self.capacity {
            return Err(CacheError::WriteRejected(format!(
                "{} bytes exceeds disk capacity of {}",
                stored_bytes, self.capacity
            )));
        }

        let file = payload_file_name(key);
        let mut state = self.state.lock();
        self.remove_record(&mut state, key);
        self.evict_for(&mut state, stored_bytes);

        let written = write_atomic(&self.directory.join(&file), &payload);
        if written.is_ok() {
            let seq = state.index.bump_seq();
            state.index.entries.insert(
                key.to_string(),
                IndexRecord {
                    file,
                    stored_bytes,
                    raw_bytes,
                    seq,
                    meta: entry.meta.clone(),
                },
            );
            state.used_bytes += stored_bytes;
        }

        if let Err(e) = self.persist_index(&state.index) {
            // The persisted index does not name the new payload; forget it
            self.remove_record(&mut state, key);
            return Err(e);
        }
        written?;
        Ok(stored_bytes)
    }
}

impl<V: CacheValue> CacheBackend<V> for DiskBackend<V> {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let mut state = self.state.lock();
        let record = state.index.entries.get(key)?.clone();

        if record.meta.is_expired() {
            self.remove_record(&mut state, key);
            self.persist_or_warn(&state.index);
            debug!(key, "disk entry expired");
            return None;
        }

        let mut entry = match self.read_payload(key, &record) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "dropping unreadable disk entry");
                self.remove_record(&mut state, key);
                self.persist_or_warn(&state.index);
                return None;
            }
        };

        let seq = state.index.bump_seq();
        let record = state.index.entries.get_mut(key)?;
        record.seq = seq;
        record.meta.touch();
        // The index is authoritative for access metadata
        entry.meta = record.meta.clone();
        self.persist_or_warn(&state.index);

        Some(entry)
    }

    fn set(&self, key: &str, mut entry: CacheEntry<V>) -> bool {
        entry.key = key.to_string();
        match self.try_set(key, &entry) {
            Ok(stored) => {
                debug!(key, stored, "stored on disk");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "disk write failed");
                false
            }
        }
    }

    fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        match self.remove_record(&mut state, key) {
            Some(_) => {
                self.persist_or_warn(&state.index);
                true
            }
            None => {
                remove_file_quiet(&self.payload_path(key));
                false
            }
        }
    }

    fn clear(&self) -> bool {
        let mut state = self.state.lock();
        let keys: Vec<String> = state.index.entries.keys().cloned().collect();
        for key in &keys {
            self.remove_record(&mut state, key);
        }
        state.used_bytes = 0;

        if let Err(e) = self.sweep_unreferenced(&HashSet::new()) {
            warn!(error = %e, "failed to sweep disk cache directory");
        }
        match self.persist_index(&state.index) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist cleared disk index");
                false
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.state.lock().index.entries.keys().cloned().collect()
    }

    fn size(&self) -> u64 {
        self.state.lock().used_bytes
    }

    fn len(&self) -> usize {
        self.state.lock().index.entries.len()
    }

    fn metadata(&self, key: &str) -> Option<EntryMeta> {
        self.state
            .lock()
            .index
            .entries
            .get(key)
            .map(|record| record.meta.clone())
    }

    fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let expired: Vec<String> = state
            .index
            .entries
            .iter()
            .filter(|(_, record)| record.meta.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_record(&mut state, key);
        }
        if !expired.is_empty() {
            self.persist_or_warn(&state.index);
        }
        expired.len()
    }
}

// == Utility Functions ==
/// Filesystem-safe payload name for a key.
fn payload_file_name(key: &str) -> String {
    format!("{}.{}", digest_hex(key.as_bytes()), PAYLOAD_EXT)
}

/// Writes through a temp file and renames it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension(TMP_EXT);
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        remove_file_quiet(&tmp);
    }
    result
}

/// Removes a file, tolerating it already being gone. True if a file was removed.
fn remove_file_quiet(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove cache file");
            false
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Job {
        title: String,
        score: f32,
    }

    fn config(dir: &Path, capacity: u64) -> DiskConfig {
        DiskConfig {
            directory: dir.to_path_buf(),
            capacity,
            compression: false,
            compression_min_bytes: 1024,
        }
    }

    fn open<V: CacheValue>(dir: &Path, capacity: u64) -> DiskBackend<V> {
        DiskBackend::open(config(dir, capacity)).unwrap()
    }

    fn job(title: &str) -> Job {
        Job {
            title: title.to_string(),
            score: 0.5,
        }
    }

    fn entry(key: &str, title: &str) -> CacheEntry<Job> {
        CacheEntry::simple(key, job(title), None).unwrap()
    }

    #[test]
    fn test_disk_set_and_get() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);

        assert!(disk.set("job:1", entry("job:1", "Engineer")));
        let got = disk.get("job:1").unwrap();

        assert_eq!(got.value, job("Engineer"));
        assert_eq!(got.meta.access_count, 1);
        assert!(disk.payload_path("job:1").is_file());
        assert!(dir.path().join(INDEX_FILE).is_file());
        assert_eq!(disk.len(), 1);
    }

    #[test]
    fn test_disk_access_count_accumulates() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("job:1", entry("job:1", "Engineer"));

        for _ in 0..3 {
            disk.get("job:1");
        }

        assert_eq!(disk.metadata("job:1").unwrap().access_count, 3);
        assert_eq!(disk.get("job:1").unwrap().meta.access_count, 4);
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let disk = open::<Job>(dir.path(), 1024 * 1024);
            disk.set("job:1", entry("job:1", "Engineer"));
            disk.set("job:2", entry("job:2", "Designer"));
            disk.get("job:1");
        }

        let disk = open::<Job>(dir.path(), 1024 * 1024);
        assert_eq!(disk.len(), 2);
        assert_eq!(disk.metadata("job:1").unwrap().access_count, 1);
        assert_eq!(disk.get("job:2").unwrap().value, job("Designer"));
        assert!(disk.size() > 0);
    }

    #[test]
    fn test_corrupted_payload_self_heals() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("job:1", entry("job:1", "Engineer"));

        let path = disk.payload_path("job:1");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(disk.get("job:1").is_none());
        assert!(!disk.keys().contains(&"job:1".to_string()));
        assert!(!path.exists());
        assert_eq!(disk.size(), 0);
    }

    #[test]
    fn test_forged_length_header_self_heals() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("job:1", entry("job:1", "Engineer"));

        // LZ4 header claiming almost 2 GiB of output
        let path = disk.payload_path("job:1");
        fs::write(&path, [1u8, 0xff, 0xff, 0xff, 0x7f, 0, 0, 0]).unwrap();

        assert!(disk.get("job:1").is_none());
        assert!(disk.keys().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_payload_self_heals() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("job:1", entry("job:1", "Engineer"));

        fs::remove_file(disk.payload_path("job:1")).unwrap();

        assert!(disk.get("job:1").is_none());
        assert!(disk.keys().is_empty());
    }

    #[test]
    fn test_mismatched_payload_is_corruption() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("a", entry("a", "A"));
        disk.set("b", entry("b", "B"));

        fs::copy(disk.payload_path("b"), disk.payload_path("a")).unwrap();

        assert!(disk.get("a").is_none());
        assert_eq!(disk.get("b").unwrap().value, job("B"));
    }

    #[test]
    fn test_delete_idempotent_and_tolerant() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("job:1", entry("job:1", "Engineer"));
        fs::remove_file(disk.payload_path("job:1")).unwrap();

        assert!(disk.delete("job:1"));
        assert!(!disk.delete("job:1"));
        assert_eq!(disk.size(), 0);
    }

    #[test]
    fn test_clear_twice() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        disk.set("a", entry("a", "A"));
        disk.set("b", entry("b", "B"));

        assert!(disk.clear());
        assert!(disk.is_empty());
        assert!(!disk.payload_path("a").exists());
        assert!(disk.clear());
        assert_eq!(disk.size(), 0);
    }

    #[test]
    fn test_disk_ttl_expiration() {
        let dir = tempdir().unwrap();
        let disk = open::<Job>(dir.path(), 1024 * 1024);
        let short = CacheEntry::simple("t", job("Temp"), Some(Duration::from_millis(50))).unwrap();
        disk.set("t", short);

        assert!(disk.get("t").is_some());
        sleep(Duration::from_millis(80));

        assert!(disk.get("t").is_none());
        assert!(!disk.payload_path("t").exists());
    }

    #[test]
    fn test_disk_lru_eviction() {
        let dir = tempdir().unwrap();

        // Measure one payload; same-length keys and values encode to the same size
        let sizing_dir = tempdir().unwrap();
        let sizing = open::<Job>(sizing_dir.path(), 1024 * 1024);
        sizing.set("k1", entry("k1", "same"));
        let one = sizing.size();

        let disk = open::<Job>(dir.path(), one * 3);
        disk.set("k1", entry("k1", "same"));
        disk.set("k2", entry("k2", "same"));
        disk.set("k3", entry("k3", "same"));
        assert_eq!(disk.len(), 3);

        // k1 becomes most recent, k2 is now the oldest
        assert!(disk.get("k1").is_some());
        disk.set("k4", entry("k4", "same"));

        assert_eq!(disk.len(), 3);
        assert!(disk.metadata("k2").is_none());
        assert!(disk.metadata("k1").is_some());
        assert!(disk.size() <= disk.capacity());
        assert_eq!(disk.evictions(), 1);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let dir = tempdir().unwrap();
        let disk = open::<String>(dir.path(), 1024);
        let small = CacheEntry::simple("s", "x".to_string(), None).unwrap();
        let huge = CacheEntry::simple("h", "x".repeat(2000), None).unwrap();

        disk.set("s", small);
        assert!(!disk.set("h", huge));
        assert!(disk.metadata("s").is_some());
        assert!(!disk.payload_path("h").exists());
    }

    #[test]
    fn test_recovery_sweeps_orphans() {
        let dir = tempdir().unwrap();
        {
            let disk = open::<Job>(dir.path(), 1024 * 1024);
            disk.set("job:1", entry("job:1", "Engineer"));
        }
        let orphan = dir.path().join(format!("{}.entry", "0".repeat(64)));
        let leftover = dir.path().join("index.tmp");
        fs::write(&orphan, b"stale").unwrap();
        fs::write(&leftover, b"half").unwrap();

        let disk = open::<Job>(dir.path(), 1024 * 1024);

        assert!(!orphan.exists());
        assert!(!leftover.exists());
        assert!(disk.get("job:1").is_some());
    }

    #[test]
    fn test_recovery_drops_records_without_payload() {
        let dir = tempdir().unwrap();
        {
            let disk = open::<Job>(dir.path(), 1024 * 1024);
            disk.set("a", entry("a", "A"));
            disk.set("b", entry("b", "B"));
            fs::remove_file(disk.payload_path("a")).unwrap();
        }

        let disk = open::<Job>(dir.path(), 1024 * 1024);
        assert_eq!(disk.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_unreadable_index_starts_empty() {
        let dir = tempdir().unwrap();
        {
            let disk = open::<Job>(dir.path(), 1024 * 1024);
            disk.set("job:1", entry("job:1", "Engineer"));
        }
        fs::write(dir.path().join(INDEX_FILE), b"{ not json").unwrap();

        let disk = open::<Job>(dir.path(), 1024 * 1024);
        assert!(disk.is_empty());
        assert!(!disk.payload_path("job:1").exists());
    }

    #[test]
    fn test_reopen_with_smaller_capacity_evicts() {
        let dir = tempdir().unwrap();
        let one = {
            let disk = open::<Job>(dir.path(), 1024 * 1024);
            disk.set("k1", entry("k1", "same"));
            disk.set("k2", entry("k2", "same"));
            disk.size() / 2
        };

        let disk = open::<Job>(dir.path(), one);
        assert_eq!(disk.keys(), vec!["k2".to_string()]);
    }

    #[test]
    fn test_compressed_payload_round_trip() {
        let dir = tempdir().unwrap();
        let disk: DiskBackend<String> = DiskBackend::open(DiskConfig {
            directory: dir.path().to_path_buf(),
            capacity: 1024 * 1024,
            compression: true,
            compression_min_bytes: 64,
        })
        .unwrap();
        let text = "senior rust engineer ".repeat(200);
        let e = CacheEntry::simple("long", text.clone(), None).unwrap();
        let logical = e.size_bytes();

        assert!(disk.set("long", e));
        assert!(disk.size() < logical);
        assert_eq!(disk.get("long").unwrap().value, text);
    }
}
