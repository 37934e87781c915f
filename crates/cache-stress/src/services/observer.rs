//! Eviction check: push extra oversized keys, then read the counters.

use crate::cache::CacheClient;
use crate::errors::StressError;
use crate::models::{bytes_to_mib, ClusterDescriptor, EvictionObservation};
use tracing::{info, instrument};

/// Overflow keys written per cluster.
pub const EVICTION_TEST_KEYS: usize = 100;

/// Size of each overflow value in bytes.
pub const EVICTION_TEST_VALUE_SIZE: usize = 30_000;

#[derive(Debug, Clone)]
pub struct EvictionObserver {
    batch_size: usize,
    value_size: usize,
}

impl Default for EvictionObserver {
    fn default() -> Self {
        Self {
            batch_size: EVICTION_TEST_KEYS,
            value_size: EVICTION_TEST_VALUE_SIZE,
        }
    }
}

impl EvictionObserver {
    /// Write the overflow batch to `cluster` and report its eviction counters.
    #[instrument(skip_all, fields(cluster_id = %cluster.cluster_id))]
    pub async fn observe<C: CacheClient + ?Sized>(
        &self,
        client: &mut C,
        cluster: &ClusterDescriptor,
    ) -> Result<EvictionObservation, StressError> {
        info!(
            target: "chaos.cache.observer",
            cluster_id = %cluster.cluster_id,
            keys = self.batch_size,
            "Writing overflow keys"
        );

        let value = vec![b'Y'; self.value_size];
        for i in 0..self.batch_size {
            client.set(&cluster.eviction_test_key(i), &value).await?;
        }

        let total_evicted_keys = client.evicted_keys().await?;
        let memory = client.memory_info().await?;
        let eviction_policy = client
            .config_get("maxmemory-policy")
            .await?
            .unwrap_or_default();

        let observation = EvictionObservation {
            cluster_id: cluster.cluster_id.clone(),
            total_evicted_keys,
            current_memory_mb: bytes_to_mib(memory.used_memory),
            max_memory_mb: bytes_to_mib(memory.max_memory),
            eviction_policy,
        };

        info!(
            target: "chaos.cache.observer",
            cluster_id = %cluster.cluster_id,
            total_evicted_keys = observation.total_evicted_keys,
            current_memory_mb = observation.current_memory_mb,
            max_memory_mb = observation.max_memory_mb,
            eviction_policy = %observation.eviction_policy,
            "Eviction observation complete"
        );

        Ok(observation)
    }
}
