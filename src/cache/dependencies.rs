//! Dependency Graph
//!
//! Tracks which keys declared a dependency on which others, in both
//! directions, so cascades only reach entries whose latest write named the
//! deleted key and edges disappear with their dependents.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

#[derive(Debug)]
struct Links {
    /// Keys this key's latest write depends on
    dependencies: HashSet<String>,
    /// Bumped on every relink, so stale liveness checks can be detected
    generation: u64,
}

// == Dependency Graph ==
/// Bidirectional dependency index owned by a cache manager.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Dependency key -> keys depending on it
    dependents: HashMap<String, HashSet<String>>,
    /// Dependent key -> its declared dependencies
    links: HashMap<String, Links>,
    next_generation: u64,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dependencies recorded for `key`.
    ///
    /// An empty set just forgets the key's old edges.
    pub fn link<I>(&mut self, key: &str, dependencies: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.unlink(key);

        let dependencies: HashSet<String> = dependencies.into_iter().collect();
        if dependencies.is_empty() {
            return;
        }
        for dependency in &dependencies {
            self.dependents
                .entry(dependency.clone())
                .or_default()
                .insert(key.to_string());
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.links.insert(
            key.to_string(),
            Links {
                dependencies,
                generation,
            },
        );
    }

    /// Forgets every edge where `key` is the dependent.
    pub fn unlink(&mut self, key: &str) {
        let Some(links) = self.links.remove(key) else {
            return;
        };
        for dependency in links.dependencies {
            if let Some(dependents) = self.dependents.get_mut(&dependency) {
                dependents.remove(key);
                if dependents.is_empty() {
                    self.dependents.remove(&dependency);
                }
            }
        }
    }

    /// Removes and returns the keys depending on `key`, forgetting their edges.
    pub fn take_dependents(&mut self, key: &str) -> HashSet<String> {
        let dependents = self.dependents.remove(key).unwrap_or_default();
        for dependent in &dependents {
            self.unlink(dependent);
        }
        dependents
    }

    /// Dependents with the generation of their current links.
    pub fn linked_keys(&self) -> Vec<(String, u64)> {
        self.links
            .iter()
            .map(|(key, links)| (key.clone(), links.generation))
            .collect()
    }

    /// Unlinks `key` only if it has not been relinked since `generation`.
    pub fn unlink_if_unchanged(&mut self, key: &str, generation: u64) -> bool {
        match self.links.get(key) {
            Some(links) if links.generation == generation => {
                self.unlink(key);
                true
            }
            _ => false,
        }
    }

    /// Number of keys with recorded dependencies.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of dependency keys with at least one dependent.
    pub fn dependency_count(&self) -> usize {
        self.dependents.len()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.links.clear();
    }
}

/// Drops the edges of dependents for which `is_live` is false.
///
/// Liveness is checked without holding the graph lock; a dependent relinked
/// in the meantime keeps its new edges. Returns how many dependents were unlinked.
pub fn prune_dependencies<F>(graph: &Mutex<DependencyGraph>, is_live: F) -> usize
where
    F: Fn(&str) -> bool,
{
    let snapshot = graph.lock().linked_keys();
    let dead: Vec<(String, u64)> = snapshot
        .into_iter()
        .filter(|(key, _)| !is_live(key))
        .collect();
    if dead.is_empty() {
        return 0;
    }

    let mut graph = graph.lock();
    let pruned = dead
        .iter()
        .filter(|(key, generation)| graph.unlink_if_unchanged(key, *generation))
        .count();
    pruned
}
