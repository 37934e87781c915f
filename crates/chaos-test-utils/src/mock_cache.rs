//! In-memory Redis fleet.
//!
//! Each cluster tracks key sizes rather than bytes: `used_memory` is a base
//! figure plus `value size + per-key overhead` for every live key. With
//! `allkeys-lru` the least recently written keys are evicted once
//! `used_memory` exceeds `maxmemory`; with any other policy such writes fail
//! with an OOM error.

use cache_stress::cache::{CacheClient, CacheConnector, MemoryInfo};
use cache_stress::errors::StressError;
use cache_stress::models::ClusterDescriptor;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const MIB: u64 = 1024 * 1024;

/// Bookkeeping bytes charged per key on top of the value size.
pub const DEFAULT_KEY_OVERHEAD: u64 = 64;

/// Initial state of one mock cluster.
#[derive(Debug, Clone)]
pub struct MockClusterSpec {
    pub base_used_memory: u64,
    pub max_memory: u64,
    pub policy: String,
    pub key_overhead: u64,
}

impl MockClusterSpec {
    /// `maxmemory 0` with `base_used_memory` already in use.
    pub fn unbounded(base_used_memory: u64) -> Self {
        Self {
            base_used_memory,
            max_memory: 0,
            policy: "noeviction".to_string(),
            key_overhead: DEFAULT_KEY_OVERHEAD,
        }
    }

    /// A bounded cluster.
    pub fn bounded(base_used_memory: u64, max_memory: u64) -> Self {
        Self {
            max_memory,
            ..Self::unbounded(base_used_memory)
        }
    }

    pub fn with_policy(mut self, policy: &str) -> Self {
        self.policy = policy.to_string();
        self
    }
}

#[derive(Debug)]
struct ClusterState {
    spec: MockClusterSpec,
    max_memory: u64,
    policy: String,
    /// Write order, oldest first.
    order: VecDeque<String>,
    sizes: HashMap<String, u64>,
    evicted_keys: u64,
    set_calls: usize,
    delete_calls: usize,
    config_sets: Vec<(String, String)>,
    /// Fail `INFO memory` once this many `SET`s have succeeded.
    fail_info_after_sets: Option<usize>,
    /// Fail `SET` once this many `SET`s have succeeded.
    fail_set_after: Option<usize>,
}

impl ClusterState {
    fn new(spec: MockClusterSpec) -> Self {
        Self {
            max_memory: spec.max_memory,
            policy: spec.policy.clone(),
            spec,
            order: VecDeque::new(),
            sizes: HashMap::new(),
            evicted_keys: 0,
            set_calls: 0,
            delete_calls: 0,
            config_sets: Vec::new(),
            fail_info_after_sets: None,
            fail_set_after: None,
        }
    }

    fn used_memory(&self) -> u64 {
        self.spec.base_used_memory
            + self
                .sizes
                .values()
                .map(|size| size + self.spec.key_overhead)
                .sum::<u64>()
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.sizes.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn set(&mut self, key: &str, size: u64) -> Result<(), StressError> {
        if let Some(limit) = self.fail_set_after {
            if self.set_calls >= limit {
                return Err(StressError::Redis(
                    "Mock SET failure: connection reset by peer".to_string(),
                ));
            }
        }

        let previous = self
            .sizes
            .get(key)
            .map_or(0, |size| size + self.spec.key_overhead);
        let projected = self.used_memory() - previous + size + self.spec.key_overhead;
        if self.max_memory > 0 && projected > self.max_memory && self.policy != "allkeys-lru" {
            return Err(StressError::Redis(
                "OOM command not allowed when used memory > 'maxmemory'.".to_string(),
            ));
        }

        self.remove(key);
        self.sizes.insert(key.to_string(), size);
        self.order.push_back(key.to_string());
        self.set_calls += 1;

        if self.max_memory > 0 && self.policy == "allkeys-lru" {
            while self.used_memory() > self.max_memory && self.order.len() > 1 {
                if let Some(oldest) = self.order.pop_front() {
                    self.sizes.remove(&oldest);
                    self.evicted_keys += 1;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FleetState {
    clusters: HashMap<String, ClusterState>,
    connects: Vec<String>,
}

/// Mock Redis fleet, keyed by cluster id.
#[derive(Debug, Clone, Default)]
pub struct MockCache {
    inner: Arc<Mutex<FleetState>>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reachable cluster.
    #[must_use]
    pub fn with_cluster(self, cluster_id: &str, spec: MockClusterSpec) -> Self {
        self.inner
            .lock()
            .unwrap()
            .clusters
            .insert(cluster_id.to_string(), ClusterState::new(spec));
        self
    }

    /// Make `INFO memory` fail on `cluster_id` once `sets` writes succeeded.
    #[must_use]
    pub fn with_failing_info_after(self, cluster_id: &str, sets: usize) -> Self {
        self.with_state(cluster_id, |state| state.fail_info_after_sets = Some(sets));
        self
    }

    /// Make `SET` fail on `cluster_id` once `sets` writes succeeded.
    #[must_use]
    pub fn with_failing_set_after(self, cluster_id: &str, sets: usize) -> Self {
        self.with_state(cluster_id, |state| state.fail_set_after = Some(sets));
        self
    }

    /// Pre-populate a key.
    #[must_use]
    pub fn with_key(self, cluster_id: &str, key: &str, size: u64) -> Self {
        self.with_state(cluster_id, |state| {
            state.set(key, size).unwrap();
            state.set_calls = 0;
        });
        self
    }

    fn with_state<R>(&self, cluster_id: &str, f: impl FnOnce(&mut ClusterState) -> R) -> R {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .clusters
            .get_mut(cluster_id)
            .unwrap_or_else(|| panic!("unknown mock cluster {cluster_id}"));
        f(state)
    }

    pub fn contains_key(&self, cluster_id: &str, key: &str) -> bool {
        self.with_state(cluster_id, |s| s.sizes.contains_key(key))
    }

    pub fn key_count(&self, cluster_id: &str) -> usize {
        self.with_state(cluster_id, |s| s.sizes.len())
    }

    pub fn keys_with_prefix(&self, cluster_id: &str, prefix: &str) -> Vec<String> {
        self.with_state(cluster_id, |s| {
            s.order.iter().filter(|k| k.starts_with(prefix)).cloned().collect()
        })
    }

    pub fn used_memory(&self, cluster_id: &str) -> u64 {
        self.with_state(cluster_id, |s| s.used_memory())
    }

    pub fn max_memory(&self, cluster_id: &str) -> u64 {
        self.with_state(cluster_id, |s| s.max_memory)
    }

    pub fn policy(&self, cluster_id: &str) -> String {
        self.with_state(cluster_id, |s| s.policy.clone())
    }

    pub fn evicted_keys(&self, cluster_id: &str) -> u64 {
        self.with_state(cluster_id, |s| s.evicted_keys)
    }

    pub fn set_calls(&self, cluster_id: &str) -> usize {
        self.with_state(cluster_id, |s| s.set_calls)
    }

    pub fn delete_calls(&self, cluster_id: &str) -> usize {
        self.with_state(cluster_id, |s| s.delete_calls)
    }

    /// Every `CONFIG SET` issued against `cluster_id`, in order.
    pub fn config_sets(&self, cluster_id: &str) -> Vec<(String, String)> {
        self.with_state(cluster_id, |s| s.config_sets.clone())
    }

    /// Cluster ids of every connection attempt, in order.
    pub fn connects(&self) -> Vec<String> {
        self.inner.lock().unwrap().connects.clone()
    }
}

/// One connection to a mock cluster.
#[derive(Debug)]
pub struct MockCacheClient {
    cluster_id: String,
    inner: Arc<Mutex<FleetState>>,
}

impl MockCacheClient {
    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut ClusterState) -> Result<R, StressError>,
    ) -> Result<R, StressError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.clusters.get_mut(&self.cluster_id) {
            Some(state) => f(state),
            None => Err(StressError::Connection("connection lost".to_string())),
        }
    }
}

fn glob_prefix(pattern: &str) -> &str {
    pattern.strip_suffix('*').unwrap_or(pattern)
}

#[async_trait::async_trait]
impl CacheClient for MockCacheClient {
    async fn config_set(&mut self, parameter: &str, value: &str) -> Result<(), StressError> {
        self.with_state(|state| {
            state
                .config_sets
                .push((parameter.to_string(), value.to_string()));
            match parameter {
                "maxmemory-policy" => state.policy = value.to_string(),
                "maxmemory" => {
                    state.max_memory = value.parse().map_err(|_| {
                        StressError::Redis(format!("Invalid argument '{value}' for CONFIG SET"))
                    })?;
                }
                other => {
                    return Err(StressError::Redis(format!(
                        "Unknown option or number of arguments for CONFIG SET - '{other}'"
                    )))
                }
            }
            Ok(())
        })
    }

    async fn config_get(&mut self, parameter: &str) -> Result<Option<String>, StressError> {
        self.with_state(|state| {
            Ok(match parameter {
                "maxmemory-policy" => Some(state.policy.clone()),
                "maxmemory" => Some(state.max_memory.to_string()),
                _ => None,
            })
        })
    }

    async fn memory_info(&mut self) -> Result<MemoryInfo, StressError> {
        self.with_state(|state| {
            if let Some(limit) = state.fail_info_after_sets {
                if state.set_calls >= limit {
                    return Err(StressError::Redis("Mock INFO failure: timed out".to_string()));
                }
            }
            Ok(MemoryInfo {
                used_memory: state.used_memory(),
                max_memory: state.max_memory,
            })
        })
    }

    async fn evicted_keys(&mut self) -> Result<u64, StressError> {
        self.with_state(|state| Ok(state.evicted_keys))
    }

    async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StressError> {
        self.with_state(|state| state.set(key, value.len() as u64))
    }

    async fn delete(&mut self, keys: &[String]) -> Result<u64, StressError> {
        self.with_state(|state| {
            if keys.is_empty() {
                return Err(StressError::Redis(
                    "ERR wrong number of arguments for 'del' command".to_string(),
                ));
            }
            state.delete_calls += 1;
            Ok(keys.iter().filter(|key| state.remove(key)).count() as u64)
        })
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>, StressError> {
        let prefix = glob_prefix(pattern);
        self.with_state(|state| {
            Ok(state
                .order
                .iter()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        })
    }
}

#[async_trait::async_trait]
impl CacheConnector for MockCache {
    type Client = MockCacheClient;

    async fn connect(&self, cluster: &ClusterDescriptor) -> Result<MockCacheClient, StressError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connects.push(cluster.cluster_id.clone());
        if !inner.clusters.contains_key(&cluster.cluster_id) {
            return Err(StressError::Connection(format!(
                "Error connecting to {}:{}. Connection refused.",
                cluster.endpoint, cluster.port
            )));
        }
        Ok(MockCacheClient {
            cluster_id: cluster.cluster_id.clone(),
            inner: Arc::clone(&self.inner),
        })
    }
}
