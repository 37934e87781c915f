//! Invocation handlers.
//!
//! Each action walks its clusters sequentially. A failure on one cluster is
//! captured as a typed outcome and rendered into the response; it never stops
//! the remaining clusters. Only request-level problems (malformed payload,
//! discovery listing failure) fail the invocation.

use crate::cache::CacheConnector;
use crate::config::Config;
use crate::errors::StressError;
use crate::models::{
    ApplyStressRequest, ApplyStressResponse, ClusterDescriptor, EvictionResult, FillPercentage,
    FindClustersRequest, FindClustersResponse, StressAction, StressKeysRequest, StressRecord,
};
use crate::observability::metrics;
use crate::services::{
    hold_stress, Cleaner, ClusterDirectory, ClusterLocator, EvictionObserver, FillAborted,
    FillReport, HoldOutcome, MemoryFiller,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Result of stressing one cluster.
#[derive(Debug)]
pub enum StressOutcome {
    Stressed {
        cluster: ClusterDescriptor,
        report: FillReport,
    },
    Failed {
        cluster: ClusterDescriptor,
        /// Keys written before the failure, if any.
        written_keys: Vec<String>,
        error: StressError,
    },
}

impl StressOutcome {
    fn failed(cluster: &ClusterDescriptor, written_keys: Vec<String>, error: StressError) -> Self {
        StressOutcome::Failed {
            cluster: cluster.clone(),
            written_keys,
            error,
        }
    }

    /// The cleanup record for this cluster. A failed cluster yields a
    /// record only if it wrote at least one key.
    #[must_use]
    pub fn into_record(self) -> Option<StressRecord> {
        match self {
            StressOutcome::Stressed { cluster, report } => Some(StressRecord {
                cluster,
                keys: report.written_keys,
            }),
            StressOutcome::Failed {
                cluster,
                written_keys,
                ..
            } if !written_keys.is_empty() => Some(StressRecord {
                cluster,
                keys: written_keys,
            }),
            StressOutcome::Failed { .. } => None,
        }
    }
}

impl fmt::Display for StressOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressOutcome::Stressed { cluster, report } => {
                write!(
                    f,
                    "Cluster {}: Created {} keys, memory: {}, evicted: {}",
                    cluster.cluster_id,
                    report.written_keys.len(),
                    report.final_used_memory,
                    report.evicted_keys
                )?;
                if let Some(onset) = report.eviction_onset_at {
                    write!(f, ", evictions started at {onset} keys")?;
                }
                Ok(())
            }
            StressOutcome::Failed { cluster, error, .. } => write!(
                f,
                "Failed to apply stress to cluster {}: {}",
                cluster.cluster_id, error
            ),
        }
    }
}

/// Result of cleaning one cluster.
#[derive(Debug)]
pub enum CleanupOutcome {
    Cleaned { cluster_id: String, deleted: u64 },
    Failed { cluster_id: String, error: StressError },
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOutcome::Cleaned {
                cluster_id,
                deleted,
            } => write!(f, "Cluster {cluster_id}: Deleted {deleted} total keys"),
            CleanupOutcome::Failed { cluster_id, error } => {
                write!(f, "Failed to cleanup cluster {cluster_id}: {error}")
            }
        }
    }
}

/// Dispatches invocations to the stress stages.
pub struct StressHandler<C, D> {
    connector: C,
    directory: D,
    filler: MemoryFiller,
    observer: EvictionObserver,
    key_prefix: String,
    default_region: String,
    shutdown: CancellationToken,
}

impl<C, D> StressHandler<C, D>
where
    C: CacheConnector,
    D: ClusterDirectory,
{
    #[must_use]
    pub fn new(connector: C, directory: D, config: &Config) -> Self {
        Self {
            connector,
            directory,
            filler: MemoryFiller::default(),
            observer: EvictionObserver::default(),
            key_prefix: config.stress_key_prefix.clone(),
            default_region: config.region.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace the fill loop (e.g. smaller limits).
    #[must_use]
    pub fn with_filler(mut self, filler: MemoryFiller) -> Self {
        self.filler = filler;
        self
    }

    /// Token that cuts the post-stress hold short when cancelled.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Route a raw event by its `action` field.
    ///
    /// A missing or unknown action is logged and answered with `null`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the payload does not match the action,
    /// `Discovery` if cluster listing fails, `Serialization` if the response
    /// cannot be encoded.
    pub async fn dispatch(&self, event: Value) -> Result<Value, StressError> {
        let Some(action) = event.get("action").and_then(Value::as_str) else {
            warn!(target: "chaos.cache.handler", "Event has no action");
            return Ok(Value::Null);
        };

        let action = match action.parse::<StressAction>() {
            Ok(action) => action,
            Err(_) => {
                warn!(target: "chaos.cache.handler", action = %action, "Unknown action");
                return Ok(Value::Null);
            }
        };

        match action {
            StressAction::ApplyStress => {
                let request: ApplyStressRequest = parse_request(event)?;
                to_json(&self.apply_stress(request).await)
            }
            StressAction::TestEvictions => {
                let request: StressKeysRequest = parse_request(event)?;
                to_json(&self.test_evictions(request).await)
            }
            StressAction::Cleanup => {
                let request: StressKeysRequest = parse_request(event)?;
                to_json(&self.cleanup(request).await)
            }
            StressAction::FindClusters => {
                let request: FindClustersRequest = parse_request(event)?;
                to_json(&self.find_clusters(request).await?)
            }
        }
    }

    /// Fill every target cluster, then hold for the requested duration.
    #[instrument(skip_all, fields(
        clusters = request.target_clusters.len(),
        fill_percentage = request.memory_fill_percentage.get(),
        duration_minutes = request.duration_minutes
    ))]
    pub async fn apply_stress(&self, request: ApplyStressRequest) -> ApplyStressResponse {
        info!(
            target: "chaos.cache.handler",
            clusters = request.target_clusters.len(),
            fill_percentage = request.memory_fill_percentage.get(),
            "Applying memory stress"
        );

        let mut stress_keys = Vec::new();
        let mut results = Vec::with_capacity(request.target_clusters.len());

        for cluster in &request.target_clusters {
            let outcome = self
                .stress_cluster(cluster, request.memory_fill_percentage)
                .await;
            results.push(outcome.to_string());
            if let Some(record) = outcome.into_record() {
                stress_keys.push(record);
            }
        }

        let duration = Duration::from_secs(request.duration_minutes.saturating_mul(60));
        if hold_stress(duration, &self.shutdown).await == HoldOutcome::Cancelled {
            warn!(target: "chaos.cache.handler", "Stress hold interrupted by shutdown");
        }

        info!(
            target: "chaos.cache.handler",
            records = stress_keys.len(),
            results = ?results,
            "Stress application complete"
        );

        ApplyStressResponse {
            stress_keys,
            results,
        }
    }

    async fn stress_cluster(
        &self,
        cluster: &ClusterDescriptor,
        percentage: FillPercentage,
    ) -> StressOutcome {
        let mut client = match self.connector.connect(cluster).await {
            Ok(client) => client,
            Err(e) => {
                log_cluster_failure("apply_stress", &cluster.cluster_id, &e);
                return StressOutcome::failed(cluster, Vec::new(), e);
            }
        };

        let namespace = cluster.stress_namespace(&self.key_prefix);
        match self
            .filler
            .fill(&mut client, &cluster.cluster_id, &namespace, percentage)
            .await
        {
            Ok(report) => StressOutcome::Stressed {
                cluster: cluster.clone(),
                report,
            },
            Err(FillAborted {
                written_keys,
                source,
            }) => {
                log_cluster_failure("apply_stress", &cluster.cluster_id, &source);
                StressOutcome::failed(cluster, written_keys, source)
            }
        }
    }

    /// Push the overflow batch into every recorded cluster.
    #[instrument(skip_all, fields(clusters = request.stress_keys.len()))]
    pub async fn test_evictions(&self, request: StressKeysRequest) -> Vec<EvictionResult> {
        info!(
            target: "chaos.cache.handler",
            clusters = request.stress_keys.len(),
            "Testing evictions"
        );

        let mut results = Vec::with_capacity(request.stress_keys.len());
        for record in &request.stress_keys {
            let cluster = &record.cluster;
            let observed = match self.connector.connect(cluster).await {
                Ok(mut client) => self.observer.observe(&mut client, cluster).await,
                Err(e) => Err(e),
            };

            results.push(match observed {
                Ok(observation) => EvictionResult::Observed(observation),
                Err(e) => {
                    log_cluster_failure("test_evictions", &cluster.cluster_id, &e);
                    EvictionResult::Failed {
                        cluster_id: cluster.cluster_id.clone(),
                        error: e.to_string(),
                    }
                }
            });
        }

        info!(
            target: "chaos.cache.handler",
            results = results.len(),
            "Eviction testing complete"
        );
        results
    }

    /// Remove stress and overflow keys from every recorded cluster.
    #[instrument(skip_all, fields(clusters = request.stress_keys.len()))]
    pub async fn cleanup(&self, request: StressKeysRequest) -> Vec<String> {
        let mut results = Vec::with_capacity(request.stress_keys.len());

        for record in &request.stress_keys {
            info!(
                target: "chaos.cache.handler",
                cluster_id = %record.cluster.cluster_id,
                keys = record.keys.len(),
                "Cleaning up stress keys"
            );
            let outcome = match self.clean_cluster(record).await {
                Ok(deleted) => {
                    metrics::record_keys_deleted(deleted);
                    CleanupOutcome::Cleaned {
                        cluster_id: record.cluster.cluster_id.clone(),
                        deleted,
                    }
                }
                Err(e) => {
                    log_cluster_failure("cleanup", &record.cluster.cluster_id, &e);
                    CleanupOutcome::Failed {
                        cluster_id: record.cluster.cluster_id.clone(),
                        error: e,
                    }
                }
            };
            results.push(outcome.to_string());
        }

        results
    }

    async fn clean_cluster(&self, record: &StressRecord) -> Result<u64, StressError> {
        let mut client = self.connector.connect(&record.cluster).await?;
        Cleaner::clean(&mut client, record).await
    }

    /// Find available Redis clusters carrying a tag.
    ///
    /// # Errors
    ///
    /// Returns `StressError::Discovery` if the cluster listing fails.
    pub async fn find_clusters(
        &self,
        request: FindClustersRequest,
    ) -> Result<FindClustersResponse, StressError> {
        let region = request.region.as_deref().unwrap_or(&self.default_region);
        let target_clusters =
            ClusterLocator::find(&self.directory, region, &request.tag_key, &request.tag_value)
                .await?;
        Ok(FindClustersResponse { target_clusters })
    }
}

fn log_cluster_failure(action: &'static str, cluster_id: &str, e: &StressError) {
    metrics::record_cluster_failure(action);
    if e.is_per_cluster() {
        error!(
            target: "chaos.cache.handler",
            action = action,
            cluster_id = %cluster_id,
            error = %e,
            "Cluster operation failed"
        );
    } else {
        warn!(
            target: "chaos.cache.handler",
            action = action,
            cluster_id = %cluster_id,
            error = %e,
            "Cluster operation failed with unexpected error kind"
        );
    }
}

fn parse_request<T: DeserializeOwned>(event: Value) -> Result<T, StressError> {
    serde_json::from_value(event).map_err(|e| StressError::InvalidRequest(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, StressError> {
    serde_json::to_value(value).map_err(|e| StressError::Serialization(e.to_string()))
}
