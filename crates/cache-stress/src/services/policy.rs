//! Eviction policy and memory ceiling setup.
//!
//! Both steps mutate the target's live configuration. They are logged as
//! explicit configuration changes, never folded into a read.

use crate::cache::CacheClient;
use crate::errors::StressError;
use crate::observability::metrics;
use tracing::{info, instrument};

/// Eviction policy applied before filling: LRU across all keys.
pub const EVICTION_POLICY: &str = "allkeys-lru";

/// Headroom added on top of current usage when `maxmemory` is unbounded.
pub const MAXMEMORY_HEADROOM_BYTES: u64 = 100 * 1024 * 1024;

/// The ceiling a fill percentage is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCeiling {
    /// `maxmemory` in effect after setup.
    pub max_memory: u64,
    /// `used_memory` observed during setup.
    pub used_memory: u64,
    /// True if `maxmemory` was 0 and this setup wrote a synthetic ceiling.
    pub synthesized: bool,
}

/// Applies the eviction policy and guarantees a bounded `maxmemory`.
pub struct PolicyConfigurer;

impl PolicyConfigurer {
    /// Set `maxmemory-policy` to [`EVICTION_POLICY`]. Idempotent.
    #[instrument(skip_all, fields(cluster_id = %cluster_id))]
    pub async fn apply_eviction_policy<C: CacheClient + ?Sized>(
        client: &mut C,
        cluster_id: &str,
    ) -> Result<(), StressError> {
        info!(
            target: "chaos.cache.policy",
            cluster_id = %cluster_id,
            policy = EVICTION_POLICY,
            "Setting eviction policy"
        );
        client.config_set("maxmemory-policy", EVICTION_POLICY).await
    }

    /// Read memory telemetry; if `maxmemory` is 0, set it to
    /// `used_memory + MAXMEMORY_HEADROOM_BYTES`.
    #[instrument(skip_all, fields(cluster_id = %cluster_id))]
    pub async fn ensure_memory_ceiling<C: CacheClient + ?Sized>(
        client: &mut C,
        cluster_id: &str,
    ) -> Result<MemoryCeiling, StressError> {
        let memory = client.memory_info().await?;

        info!(
            target: "chaos.cache.policy",
            cluster_id = %cluster_id,
            used_memory = memory.used_memory,
            max_memory = memory.max_memory,
            "Read memory telemetry"
        );

        if memory.max_memory > 0 {
            return Ok(MemoryCeiling {
                max_memory: memory.max_memory,
                used_memory: memory.used_memory,
                synthesized: false,
            });
        }

        let max_memory = memory.used_memory.saturating_add(MAXMEMORY_HEADROOM_BYTES);
        info!(
            target: "chaos.cache.policy",
            cluster_id = %cluster_id,
            previous_max_memory = 0,
            new_max_memory = max_memory,
            "maxmemory unbounded, writing synthetic ceiling to target configuration"
        );
        client
            .config_set("maxmemory", &max_memory.to_string())
            .await?;
        metrics::record_memory_ceiling_synthesized();

        Ok(MemoryCeiling {
            max_memory,
            used_memory: memory.used_memory,
            synthesized: true,
        })
    }
}
