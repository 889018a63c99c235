//! Cache Cleanup Task
//!
//! Background task that periodically sweeps expired entries from both tiers,
//! drops dependency edges of entries that no longer exist, and warns when the
//! hit rate drops. Reads already expire entries lazily, so
//! the sweep only bounds how long dead entries occupy space.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{prune_dependencies, CacheStats, CacheValue, DependencyGraph, MultiTierCache};
use crate::config::CacheConfig;

/// Tuning for the cleanup task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanupSettings {
    /// Time between passes
    pub interval: Duration,
    /// Hit rate (percent) below which a warning is logged
    pub alert_percent: f64,
    /// Lookups required before the hit rate is judged
    pub min_requests: u64,
}

impl From<&CacheConfig> for CleanupSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.cleanup_interval.max(1)),
            alert_percent: config.hit_rate_alert_percent,
            min_requests: config.hit_rate_min_requests,
        }
    }
}

/// Outcome of one cleanup pass.
#[derive(Debug, Clone)]
pub struct CleanupReport {
    /// Expired entries removed
    pub purged: usize,
    /// Dependents whose edges were dropped because they no longer exist
    pub pruned_links: usize,
    /// Statistics taken after the sweep
    pub stats: CacheStats,
    /// Hit rate was judged and found below the alert threshold
    pub low_hit_rate: bool,
}

/// Runs a single cleanup pass synchronously.
pub fn run_cleanup_pass<V: CacheValue>(
    cache: &MultiTierCache<V>,
    graph: &Mutex<DependencyGraph>,
    settings: &CleanupSettings,
) -> CleanupReport {
    let purged = cache.purge_expired();
    if purged > 0 {
        info!("Cache cleanup: removed {} expired entries", purged);
    } else {
        debug!("Cache cleanup: no expired entries found");
    }

    let pruned_links = prune_dependencies(graph, |key| cache.contains(key));
    if pruned_links > 0 {
        debug!("Cache cleanup: dropped dependency links of {} missing entries", pruned_links);
    }

    let stats = cache.stats();
    let low_hit_rate =
        stats.total_requests >= settings.min_requests && stats.hit_rate_percent < settings.alert_percent;
    if low_hit_rate {
        warn!(
            hit_rate_percent = stats.hit_rate_percent,
            requests = stats.total_requests,
            threshold = settings.alert_percent,
            "Cache hit rate below threshold"
        );
    }

    CleanupReport {
        purged,
        pruned_links,
        stats,
        low_hit_rate,
    }
}

/// Spawns a background task that periodically runs [`run_cleanup_pass`].
///
/// Each pass runs on the blocking pool since it may touch the disk tier.
///
/// # Returns
/// A JoinHandle for the spawned task, which is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(tiers.clone(), graph.clone(), CleanupSettings::from(&config));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<V: CacheValue>(
    cache: Arc<MultiTierCache<V>>,
    graph: Arc<Mutex<DependencyGraph>>,
    settings: CleanupSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {:?}",
            settings.interval
        );

        loop {
            tokio::time::sleep(settings.interval).await;

            let cache = Arc::clone(&cache);
            let graph = Arc::clone(&graph);
            let pass =
                tokio::task::spawn_blocking(move || run_cleanup_pass(&cache, &graph, &settings));
            if let Err(e) = pass.await {
                warn!(error = %e, "Cache cleanup pass failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, CacheLevel, SetOptions};
    use tempfile::{tempdir, TempDir};

    fn graph() -> Arc<Mutex<DependencyGraph>> {
        Arc::new(Mutex::new(DependencyGraph::new()))
    }

    fn tiers() -> (TempDir, Arc<MultiTierCache<String>>) {
        let dir = tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(dir.path());
        (dir, Arc::new(MultiTierCache::open(&config).unwrap()))
    }

    fn settings(interval_ms: u64) -> CleanupSettings {
        CleanupSettings {
            interval: Duration::from_millis(interval_ms),
            alert_percent: 50.0,
            min_requests: 4,
        }
    }

    #[test]
    fn test_settings_from_config() {
        let config = CacheConfig {
            cleanup_interval: 0,
            ..CacheConfig::default()
        };
        let settings = CleanupSettings::from(&config);
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.alert_percent, 50.0);
    }

    #[test]
    fn test_pass_flags_low_hit_rate() {
        let (_dir, cache) = tiers();
        cache.set("k", "v".into(), SetOptions::new());
        cache.get("k");
        for _ in 0..3 {
            cache.get("missing");
        }

        let report = run_cleanup_pass(&cache, &graph(), &settings(10));
        assert!(report.low_hit_rate);
        assert_eq!(report.stats.total_requests, 4);
    }

    #[test]
    fn test_pass_ignores_small_samples() {
        let (_dir, cache) = tiers();
        cache.get("missing");

        let report = run_cleanup_pass(&cache, &graph(), &settings(10));
        assert!(!report.low_hit_rate);
    }

    #[test]
    fn test_pass_prunes_links_of_missing_entries() {
        let (_dir, cache) = tiers();
        let links = graph();
        cache.set("job:1", "v".into(), SetOptions::new().depends_on(["profile:1"]));
        links.lock().link("job:1", vec!["profile:1".to_string()]);
        links.lock().link("job:2", vec!["profile:2".to_string()]);

        let report = run_cleanup_pass(&cache, &links, &settings(10));

        assert_eq!(report.pruned_links, 1);
        assert_eq!(links.lock().len(), 1);
        assert_eq!(links.lock().dependency_count(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let (_dir, cache) = tiers();
        cache.set(
            "expire_soon",
            "value".into(),
            SetOptions::new().ttl(Duration::from_millis(30)),
        );
        cache.set(
            "expire_soon_disk",
            "value".into(),
            SetOptions::new()
                .ttl(Duration::from_millis(30))
                .level(CacheLevel::Disk),
        );

        let handle = spawn_cleanup_task(cache.clone(), graph(), settings(50));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Swept without any read touching them
        assert_eq!(cache.memory().len(), 0);
        assert_eq!(cache.disk().len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let (_dir, cache) = tiers();
        cache.set("long_lived", "value".into(), SetOptions::new().ttl_secs(3600));

        let handle = spawn_cleanup_task(cache.clone(), graph(), settings(20));
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.get("long_lived").as_deref(), Some("value"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (_dir, cache) = tiers();
        let handle = spawn_cleanup_task(cache, graph(), settings(1000));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
