//! Memory-pressure fill loop.
//!
//! Writes fixed-size values under `<namespace>:<n>` until the target's live
//! `used_memory` reaches `max_memory * fill_percentage / 100`, or until the
//! key cap is hit, whichever comes first.
//!
//! # Loop invariants
//!
//! - `used_memory` is read immediately before every write decision; external
//!   eviction can lower it between iterations, so it is never cached.
//! - The key cap is checked before each write, so a cap of zero writes
//!   nothing.
//! - A write failure aborts the cluster, but the keys written so far travel
//!   with the error ([`FillAborted`]) so cleanup can still remove them.
//! - The eviction counter is sampled every `sample_interval` keys. The first
//!   non-zero sample is recorded as the eviction onset; later samples only
//!   feed debug logs.

use crate::cache::CacheClient;
use crate::errors::StressError;
use crate::models::FillPercentage;
use crate::observability::metrics;
use crate::services::policy::{MemoryCeiling, PolicyConfigurer};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Size of each synthetic value in bytes.
pub const STRESS_VALUE_SIZE: usize = 50_000;

/// Hard cap on keys written per cluster.
pub const MAX_STRESS_KEYS: usize = 5_000;

/// Keys written between eviction-counter samples.
pub const EVICTION_SAMPLE_INTERVAL: usize = 50;

/// Tunables of the fill loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillLimits {
    pub value_size: usize,
    pub max_keys: usize,
    pub sample_interval: usize,
}

impl Default for FillLimits {
    fn default() -> Self {
        Self {
            value_size: STRESS_VALUE_SIZE,
            max_keys: MAX_STRESS_KEYS,
            sample_interval: EVICTION_SAMPLE_INTERVAL,
        }
    }
}

/// Memory level the loop aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTarget {
    max_memory: u64,
    percentage: FillPercentage,
}

impl FillTarget {
    #[must_use]
    pub fn new(max_memory: u64, percentage: FillPercentage) -> Self {
        Self {
            max_memory,
            percentage,
        }
    }

    /// `max_memory * percentage / 100`, rounded down.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        let bytes = u128::from(self.max_memory) * u128::from(self.percentage.get()) / 100;
        u64::try_from(bytes).unwrap_or(u64::MAX)
    }

    /// Exact comparison `used >= max_memory * percentage / 100`, without
    /// the rounding of [`FillTarget::bytes`].
    #[must_use]
    pub fn is_reached(&self, used_memory: u64) -> bool {
        u128::from(used_memory) * 100
            >= u128::from(self.max_memory) * u128::from(self.percentage.get())
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillExit {
    /// `used_memory` reached the target.
    TargetReached,
    /// The key cap was hit first. Expected for high percentages on small
    /// ceilings, not an error.
    KeyCapReached,
}

impl FillExit {
    /// Metric label for this exit.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            FillExit::TargetReached => "target_reached",
            FillExit::KeyCapReached => "key_cap_reached",
        }
    }
}

/// Outcome of a completed fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub ceiling: MemoryCeiling,
    pub target_memory: u64,
    pub exit: FillExit,
    pub written_keys: Vec<String>,
    pub final_used_memory: u64,
    pub evicted_keys: u64,
    /// Key count at which a non-zero eviction counter was first sampled.
    pub eviction_onset_at: Option<usize>,
}

/// A fill that failed part-way. Carries whatever keys were written.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FillAborted {
    pub written_keys: Vec<String>,
    #[source]
    pub source: StressError,
}

impl FillAborted {
    fn new(written_keys: Vec<String>, source: StressError) -> Self {
        Self {
            written_keys,
            source,
        }
    }
}

impl From<StressError> for FillAborted {
    fn from(source: StressError) -> Self {
        Self::new(Vec::new(), source)
    }
}

/// Fills one target with synthetic keys.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiller {
    limits: FillLimits,
}

impl MemoryFiller {
    #[must_use]
    pub fn new(limits: FillLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn limits(&self) -> FillLimits {
        self.limits
    }

    /// Run policy setup and the fill loop against one connected target.
    ///
    /// # Errors
    ///
    /// Returns `FillAborted` on any command failure; its `written_keys` holds
    /// the partial sequence.
    #[instrument(skip_all, fields(cluster_id = %cluster_id, fill_percentage = percentage.get()))]
    pub async fn fill<C: CacheClient + ?Sized>(
        &self,
        client: &mut C,
        cluster_id: &str,
        namespace: &str,
        percentage: FillPercentage,
    ) -> Result<FillReport, FillAborted> {
        let result = self.run(client, cluster_id, namespace, percentage).await;
        match &result {
            Ok(report) => metrics::record_fill(report.exit.as_label(), report.written_keys.len()),
            Err(aborted) => metrics::record_fill(metrics::FILL_ABORTED, aborted.written_keys.len()),
        }
        result
    }

    async fn run<C: CacheClient + ?Sized>(
        &self,
        client: &mut C,
        cluster_id: &str,
        namespace: &str,
        percentage: FillPercentage,
    ) -> Result<FillReport, FillAborted> {
        PolicyConfigurer::apply_eviction_policy(client, cluster_id).await?;
        let ceiling = PolicyConfigurer::ensure_memory_ceiling(client, cluster_id).await?;

        let target = FillTarget::new(ceiling.max_memory, percentage);
        info!(
            target: "chaos.cache.filler",
            cluster_id = %cluster_id,
            max_memory = ceiling.max_memory,
            target_memory = target.bytes(),
            "Starting fill"
        );

        let value = vec![b'X'; self.limits.value_size];
        let mut written_keys: Vec<String> = Vec::new();
        let mut eviction_onset_at = None;

        let exit = loop {
            let used_memory = match client.memory_info().await {
                Ok(memory) => memory.used_memory,
                Err(e) => return Err(FillAborted::new(written_keys, e)),
            };
            if target.is_reached(used_memory) {
                info!(
                    target: "chaos.cache.filler",
                    cluster_id = %cluster_id,
                    used_memory = used_memory,
                    target_memory = target.bytes(),
                    keys_written = written_keys.len(),
                    "Target memory reached"
                );
                break FillExit::TargetReached;
            }

            if written_keys.len() >= self.limits.max_keys {
                info!(
                    target: "chaos.cache.filler",
                    cluster_id = %cluster_id,
                    max_keys = self.limits.max_keys,
                    "Key cap reached before target memory"
                );
                break FillExit::KeyCapReached;
            }

            let key = format!("{namespace}:{}", written_keys.len());
            if let Err(e) = client.set(&key, &value).await {
                return Err(FillAborted::new(written_keys, e));
            }
            written_keys.push(key);
            let count = written_keys.len();

            if self.limits.sample_interval > 0 && count % self.limits.sample_interval == 0 {
                let evicted = match client.evicted_keys().await {
                    Ok(evicted) => evicted,
                    Err(e) => return Err(FillAborted::new(written_keys, e)),
                };
                debug!(
                    target: "chaos.cache.filler",
                    cluster_id = %cluster_id,
                    keys_written = count,
                    used_memory = used_memory,
                    evicted_keys = evicted,
                    "Fill progress"
                );
                if evicted > 0 && eviction_onset_at.is_none() {
                    eviction_onset_at = Some(count);
                    metrics::record_eviction_onset(count);
                    info!(
                        target: "chaos.cache.filler",
                        cluster_id = %cluster_id,
                        keys_written = count,
                        evicted_keys = evicted,
                        "Eviction onset detected"
                    );
                }
            }
        };

        let final_used_memory = match client.memory_info().await {
            Ok(memory) => memory.used_memory,
            Err(e) => return Err(FillAborted::new(written_keys, e)),
        };
        let evicted_keys = match client.evicted_keys().await {
            Ok(evicted) => evicted,
            Err(e) => return Err(FillAborted::new(written_keys, e)),
        };

        Ok(FillReport {
            ceiling,
            target_memory: target.bytes(),
            exit,
            written_keys,
            final_used_memory,
            evicted_keys,
            eviction_onset_at,
        })
    }
}
