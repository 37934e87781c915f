//! Request and response payloads.
//!
//! Field names follow the orchestrator's wire format: request envelopes are
//! camelCase (`targetClusters`, `memoryFillPercentage`) while cluster
//! records keep snake_case (`cluster_id`).

use crate::errors::StressError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key prefix of the overflow keys.
pub const EVICTION_TEST_PREFIX: &str = "eviction_test";

/// Identifies a target cache instance. Never mutated once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    pub cluster_id: String,
    pub endpoint: String,
    pub port: u16,
}

impl ClusterDescriptor {
    /// Namespace of this cluster's stress keys (`<prefix>:<cluster_id>`).
    #[must_use]
    pub fn stress_namespace(&self, prefix: &str) -> String {
        format!("{prefix}:{}", self.cluster_id)
    }

    /// Name of the `index`-th overflow key.
    #[must_use]
    pub fn eviction_test_key(&self, index: usize) -> String {
        format!("{EVICTION_TEST_PREFIX}:{}:{index}", self.cluster_id)
    }

    /// `KEYS` pattern matching every overflow key of this cluster.
    #[must_use]
    pub fn eviction_test_pattern(&self) -> String {
        format!("{EVICTION_TEST_PREFIX}:{}:*", self.cluster_id)
    }
}

impl fmt::Display for ClusterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.cluster_id, self.endpoint, self.port)
    }
}

/// A cluster plus the ordered keys written into it during one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressRecord {
    #[serde(flatten)]
    pub cluster: ClusterDescriptor,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Fill percentage in `[0, 100]`.
///
/// Accepts a JSON integer or a numeric string, since automation documents
/// often pass parameters as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FillPercentage(u8);

impl FillPercentage {
    /// Validate a raw percentage.
    ///
    /// # Errors
    ///
    /// Returns `StressError::InvalidRequest` outside `[0, 100]`.
    pub fn new(value: i64) -> Result<Self, StressError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(FillPercentage)
            .ok_or_else(|| {
                StressError::InvalidRequest(format!(
                    "memoryFillPercentage must be between 0 and 100, got {value}"
                ))
            })
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for FillPercentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = deserialize_flexible_int(deserializer)?;
        FillPercentage::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleInt {
    Int(i64),
    Text(String),
}

fn deserialize_flexible_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match FlexibleInt::deserialize(deserializer)? {
        FlexibleInt::Int(v) => Ok(v),
        FlexibleInt::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}

fn deserialize_duration_minutes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<u64, D::Error> {
    let raw = deserialize_flexible_int(deserializer)?;
    u64::try_from(raw).map_err(|_| {
        serde::de::Error::custom(format!("durationMinutes must be >= 0, got {raw}"))
    })
}

/// `apply_stress` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStressRequest {
    pub target_clusters: Vec<ClusterDescriptor>,
    pub memory_fill_percentage: FillPercentage,
    #[serde(default, deserialize_with = "deserialize_duration_minutes")]
    pub duration_minutes: u64,
}

/// `apply_stress` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStressResponse {
    pub stress_keys: Vec<StressRecord>,
    pub results: Vec<String>,
}

/// `test_evictions` and `cleanup` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressKeysRequest {
    pub stress_keys: Vec<StressRecord>,
}

/// Counters read from one cluster after the eviction check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvictionObservation {
    pub cluster_id: String,
    pub total_evicted_keys: u64,
    pub current_memory_mb: f64,
    pub max_memory_mb: f64,
    pub eviction_policy: String,
}

/// One `test_evictions` entry: an observation or the error that prevented it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvictionResult {
    Observed(EvictionObservation),
    Failed { cluster_id: String, error: String },
}

impl EvictionResult {
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        match self {
            EvictionResult::Observed(o) => &o.cluster_id,
            EvictionResult::Failed { cluster_id, .. } => cluster_id,
        }
    }
}

/// `find_clusters` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindClustersRequest {
    #[serde(default)]
    pub region: Option<String>,
    pub tag_key: String,
    pub tag_value: String,
}

/// `find_clusters` response, shaped to feed straight into `apply_stress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindClustersResponse {
    pub target_clusters: Vec<ClusterDescriptor>,
}

/// Actions understood by the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressAction {
    ApplyStress,
    TestEvictions,
    Cleanup,
    FindClusters,
}

impl FromStr for StressAction {
    type Err = StressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply_stress" => Ok(StressAction::ApplyStress),
            "test_evictions" => Ok(StressAction::TestEvictions),
            "cleanup" => Ok(StressAction::Cleanup),
            "find_clusters" => Ok(StressAction::FindClusters),
            other => Err(StressError::InvalidRequest(format!("unknown action {other}"))),
        }
    }
}

/// Convert bytes to MiB rounded to two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
