//! Integration Tests for the Cache Manager
//!
//! Exercises the public library surface end to end against real directories.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::tempdir;
use tiercache::cache::CacheBackend;
use tiercache::{CacheConfig, CacheLevel, CacheManager, SetOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JobPosting {
    title: String,
    company: String,
}

fn posting() -> JobPosting {
    JobPosting {
        title: "Engineer".to_string(),
        company: "Acme".to_string(),
    }
}

#[test]
fn test_disk_entries_survive_restart() {
    let dir = tempdir().unwrap();
    let config = CacheConfig::default().with_cache_dir(dir.path());

    {
        let cache = CacheManager::<JobPosting>::new(config.clone()).unwrap();
        assert!(cache.set(
            "job:1",
            posting(),
            SetOptions::new().level(CacheLevel::Disk).tags(["jobs"])
        ));
        assert!(cache.set("job:2", posting(), SetOptions::new()));
    }

    let cache = CacheManager::<JobPosting>::new(config).unwrap();
    assert_eq!(cache.get("job:1"), Some(posting()));
    // Memory contents are not persisted
    assert!(cache.get("job:2").is_none());

    // Tags survive with the entry
    assert_eq!(cache.invalidate_by_tags(&["jobs".to_string()]), 1);
}

#[test]
fn test_large_values_go_to_disk() {
    let dir = tempdir().unwrap();
    let config = CacheConfig {
        memory_entry_limit: 1024,
        ..CacheConfig::default().with_cache_dir(dir.path())
    };
    let cache = CacheManager::<String>::new(config).unwrap();

    cache.set("small", "s".repeat(10), SetOptions::new());
    cache.set("large", "l".repeat(4096), SetOptions::new());

    let stats = cache.stats();
    assert_eq!(stats.memory_entry_count, 1);
    assert_eq!(stats.disk_entry_count, 1);
    assert!(cache.tiers().disk().metadata("large").is_some());
    assert_eq!(cache.get("large").map(|v| v.len()), Some(4096));
}

#[test]
fn test_job_scenario() {
    let dir = tempdir().unwrap();
    let cache = CacheManager::<JobPosting>::new(CacheConfig::default().with_cache_dir(dir.path()))
        .unwrap();

    let options = SetOptions::new()
        .ttl(Duration::from_secs(1))
        .tags(["profile:A"])
        .depends_on(["profile:A"]);
    assert!(cache.set("job:123", posting(), options.clone()));
    assert_eq!(cache.get("job:123"), Some(posting()));

    // Deleting the dependency removes the job
    cache.delete("profile:A");
    assert!(cache.get("job:123").is_none());

    // Expiry
    cache.set("job:123", posting(), options);
    let misses = cache.stats().misses;
    std::thread::sleep(Duration::from_millis(1100));
    assert!(cache.get("job:123").is_none());
    assert_eq!(cache.stats().misses, misses + 1);
}

#[test]
fn test_warm_then_memoize() {
    let dir = tempdir().unwrap();
    let cache =
        CacheManager::<u64>::new(CacheConfig::default().with_cache_dir(dir.path())).unwrap();

    let warmed = cache.warm_cache(|| (0..5).map(|i| (format!("n:{}", i), i * i)).collect());
    assert_eq!(warmed, 5);
    assert_eq!(cache.get("n:3"), Some(9));

    let square = cache.memoize("square", None, Vec::new(), |n: u64| n * n);
    assert_eq!(square(12), 144);
    assert_eq!(square(12), 144);
    assert_eq!(cache.invalidate_by_pattern("^memo:square:").unwrap(), 1);

    let empty: HashMap<String, u64> = HashMap::new();
    assert_eq!(cache.warm_cache(move || empty), 0);
}

#[tokio::test]
async fn test_started_manager_sweeps_expired_entries() {
    let dir = tempdir().unwrap();
    let config = CacheConfig {
        cleanup_interval: 1,
        ..CacheConfig::default().with_cache_dir(dir.path())
    };
    let cache = CacheManager::<String>::new(config).unwrap();
    cache.set(
        "short",
        "lived".into(),
        SetOptions::new().ttl(Duration::from_millis(100)).level(CacheLevel::Disk),
    );

    assert!(cache.start().unwrap());
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(cache.tiers().disk().len(), 0);
    cache.shutdown();
    assert!(!cache.is_running());
}
