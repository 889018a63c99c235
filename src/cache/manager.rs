//! Cache Manager
//!
//! The façade external callers use. On top of the multi-tier cache it keeps
//! the dependency graph for cascading deletes, pattern invalidation, cache
//! warming, memoization and the lifecycle of the background cleanup task.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dependencies::{prune_dependencies, DependencyGraph};
use super::entry::{digest_hex, CacheValue};
use super::stats::CacheStats;
use super::tiered::{MultiTierCache, SetOptions};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_cleanup_task, CleanupSettings};

// == Cache Manager ==
/// Explicitly constructed cache instance.
///
/// Nothing runs in the background until [`CacheManager::start`] is called;
/// [`CacheManager::shutdown`] (or dropping the manager) stops it again.
pub struct CacheManager<V> {
    tiers: Arc<MultiTierCache<V>>,
    /// Declared dependencies, shared with the cleanup task for pruning
    graph: Arc<Mutex<DependencyGraph>>,
    config: CacheConfig,
    cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl<V: CacheValue> CacheManager<V> {
    // == Constructor ==
    /// Opens both tiers as configured.
    ///
    /// Fails only if the disk tier directory cannot be created or scanned.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let tiers = MultiTierCache::open(&config)?;
        Ok(Self::with_tiers(tiers, config))
    }

    /// Wraps an already composed multi-tier cache.
    pub fn with_tiers(tiers: MultiTierCache<V>, config: CacheConfig) -> Self {
        Self {
            tiers: Arc::new(tiers),
            graph: Arc::new(Mutex::new(DependencyGraph::new())),
            config,
            cleanup: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Underlying tiers.
    pub fn tiers(&self) -> &MultiTierCache<V> {
        &self.tiers
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<V> {
        self.tiers.get(key)
    }

    // == Set ==
    /// Stores a value and records its declared dependencies.
    ///
    /// Dependencies recorded by an earlier write of the same key are replaced,
    /// so only the latest write decides what cascades into it.
    pub fn set(&self, key: &str, value: V, options: SetOptions) -> bool {
        let dependencies = options.dependencies.clone();
        let stored = self.tiers.set(key, value, options);

        let mut graph = self.graph.lock();
        if stored {
            graph.link(key, dependencies);
        } else {
            // A failed write removes the key from both tiers
            graph.unlink(key);
        }
        stored
    }

    // == Delete ==
    /// Removes `key` and every entry that declared a dependency on it.
    ///
    /// The cascade goes one level deep: dependents of the dependents are
    /// left alone. True if the key or any dependent was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut removed = HashSet::new();
        self.delete_into(key, &mut removed);
        !removed.is_empty()
    }

    /// Deletes `key` and its dependents, adding every key actually removed to `removed`.
    fn delete_into(&self, key: &str, removed: &mut HashSet<String>) {
        if self.tiers.delete(key) {
            removed.insert(key.to_string());
        }

        let dependents = {
            let mut graph = self.graph.lock();
            graph.unlink(key);
            graph.take_dependents(key)
        };

        let mut cascaded = 0;
        for dependent in dependents {
            if self.tiers.delete(&dependent) {
                cascaded += 1;
                removed.insert(dependent);
            }
        }
        if cascaded > 0 {
            debug!(key, cascaded, "cascade delete");
        }
    }

    /// Deletes every known key matching the regular expression `pattern`.
    ///
    /// Matching is unanchored; use `^` and `$` for whole-key matches. Each
    /// match is deleted like [`CacheManager::delete`], so its dependents
    /// cascade. Returns how many matching keys were removed, including
    /// matches that went as another match's dependent.
    pub fn invalidate_by_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let matched: Vec<String> = self
            .tiers
            .keys()
            .into_iter()
            .filter(|key| regex.is_match(key))
            .collect();

        let mut removed = HashSet::new();
        for key in &matched {
            self.delete_into(key, &mut removed);
        }

        let count = matched.iter().filter(|key| removed.contains(*key)).count();
        debug!(
            pattern,
            removed = count,
            cascaded = removed.len() - count,
            "invalidated by pattern"
        );
        Ok(count)
    }

    /// Removes every entry carrying any of `tags`.
    pub fn invalidate_by_tags(&self, tags: &[String]) -> usize {
        let removed = self.tiers.invalidate_by_tags(tags);
        if removed > 0 {
            self.prune_dependencies();
        }
        removed
    }

    /// Drops dependency edges of entries no longer held by either tier.
    ///
    /// Returns how many dependents were forgotten.
    pub fn prune_dependencies(&self) -> usize {
        prune_dependencies(&self.graph, |key| self.tiers.contains(key))
    }

    /// Number of keys with recorded dependencies.
    pub fn dependency_count(&self) -> usize {
        self.graph.lock().len()
    }

    /// Pre-populates the cache with the producer's entries under the default TTL.
    ///
    /// Returns how many entries were stored.
    pub fn warm_cache<F>(&self, producer: F) -> usize
    where
        F: FnOnce() -> HashMap<String, V>,
    {
        let options = SetOptions::new().ttl_secs(self.config.default_ttl);
        let entries = producer();
        let total = entries.len();

        let mut stored = 0;
        for (key, value) in entries {
            if self.set(&key, value, options.clone()) {
                stored += 1;
            }
        }
        info!(stored, total, "cache warmed");
        stored
    }

    /// Wraps `f` so results are cached per argument value.
    ///
    /// The cache key is built from `name` and a digest of the serialized
    /// arguments, so `name` must identify the function. Arguments that cannot
    /// be serialized skip the cache and call `f` directly.
    pub fn memoize<A, F>(
        &self,
        name: &str,
        ttl_seconds: Option<u64>,
        tags: Vec<String>,
        f: F,
    ) -> impl Fn(A) -> V + Send + Sync
    where
        A: Serialize,
        F: Fn(A) -> V + Send + Sync,
    {
        let tiers = Arc::clone(&self.tiers);
        let prefix = format!("memo:{}:", name);
        let options = SetOptions {
            ttl: ttl_seconds.map(Duration::from_secs),
            tags,
            ..SetOptions::default()
        };

        move |args: A| {
            let key = match serde_json::to_vec(&args) {
                Ok(encoded) => format!("{}{}", prefix, digest_hex(&encoded)),
                Err(e) => {
                    warn!(error = %e, "memoized arguments not serializable, bypassing cache");
                    return f(args);
                }
            };

            if let Some(cached) = tiers.get(&key) {
                return cached;
            }
            let value = f(args);
            tiers.set(&key, value.clone(), options.clone());
            value
        }
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.tiers.stats()
    }

    /// Every key currently known to either tier.
    pub fn keys(&self) -> Vec<String> {
        self.tiers.keys()
    }

    /// Empties both tiers and forgets all declared dependencies.
    pub fn clear(&self) -> bool {
        self.graph.lock().clear();
        self.tiers.clear()
    }

    // == Lifecycle ==
    /// Starts the background cleanup task on the current Tokio runtime.
    ///
    /// Returns `Ok(false)` if it is already running.
    pub fn start(&self) -> Result<bool> {
        tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let mut slot = self.cleanup.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(false);
        }

        let settings = CleanupSettings::from(&self.config);
        *slot = Some(spawn_cleanup_task(
            Arc::clone(&self.tiers),
            Arc::clone(&self.graph),
            settings,
        ));
        info!(interval = ?settings.interval, "cache manager started");
        Ok(true)
    }
}

impl<V> CacheManager<V> {
    /// True while the background task is running.
    pub fn is_running(&self) -> bool {
        self.cleanup
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the background task. Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(handle) = self.cleanup.lock().take() {
            handle.abort();
            info!("cache manager shut down");
        }
    }
}

impl<V> Drop for CacheManager<V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
