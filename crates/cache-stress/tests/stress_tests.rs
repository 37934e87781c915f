//! Integration tests for the stress actions.
//!
//! Runs the handler end-to-end against the in-memory Redis fleet.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use anyhow::Result;
use cache_stress::config::Config;
use cache_stress::errors::StressError;
use cache_stress::handlers::StressHandler;
use cache_stress::models::{
    ApplyStressRequest, ApplyStressResponse, ClusterDescriptor, EvictionResult, FillPercentage,
    StressKeysRequest, StressRecord,
};
use cache_stress::services::filler::{FillExit, MAX_STRESS_KEYS, STRESS_VALUE_SIZE};
use cache_stress::services::locator::mock::MockClusterDirectory;
use cache_stress::services::MemoryFiller;
use chaos_test_utils::mock_cache::DEFAULT_KEY_OVERHEAD;
use chaos_test_utils::{MockCache, MockClusterSpec, MIB};
use common::observability::testing::capture_metrics_async;
use serde_json::{json, Value};

const KEY_COST: u64 = STRESS_VALUE_SIZE as u64 + DEFAULT_KEY_OVERHEAD;

fn cluster(id: &str) -> ClusterDescriptor {
    ClusterDescriptor {
        cluster_id: id.to_string(),
        endpoint: format!("{id}.abc123.cache.amazonaws.com"),
        port: 6379,
    }
}

fn handler(cache: &MockCache) -> StressHandler<MockCache, MockClusterDirectory> {
    StressHandler::new(cache.clone(), MockClusterDirectory::new(), &Config::default())
}

fn apply_request(ids: &[&str], percentage: i64) -> ApplyStressRequest {
    ApplyStressRequest {
        target_clusters: ids.iter().map(|id| cluster(id)).collect(),
        memory_fill_percentage: FillPercentage::new(percentage).unwrap(),
        duration_minutes: 0,
    }
}

/// Unbounded cluster: ceiling becomes used + 100 MiB, fill stops at the target.
#[tokio::test]
async fn test_unbounded_cluster_gets_synthetic_ceiling() {
    let cache = MockCache::new().with_cluster("redis-a", MockClusterSpec::unbounded(10 * MIB));

    let response = handler(&cache)
        .apply_stress(apply_request(&["redis-a"], 50))
        .await;

    assert_eq!(cache.max_memory("redis-a"), 110 * MIB);
    assert_eq!(cache.policy("redis-a"), "allkeys-lru");

    let used = cache.used_memory("redis-a");
    assert!(used >= 55 * MIB, "used {used} below target");
    // One key fewer would have been below the target.
    assert!(used - KEY_COST < 55 * MIB);

    assert_eq!(response.stress_keys.len(), 1);
    let keys = &response.stress_keys[0].keys;
    assert!(keys.len() < MAX_STRESS_KEYS);
    assert_eq!(keys[0], "fis_stress:redis-a:0");
    assert_eq!(
        keys.last().unwrap(),
        &format!("fis_stress:redis-a:{}", keys.len() - 1)
    );
    assert_eq!(
        response.results,
        vec![format!(
            "Cluster redis-a: Created {} keys, memory: {used}, evicted: 0",
            keys.len()
        )]
    );
}

/// A huge ceiling is never reached, so the key cap is the only exit.
#[tokio::test]
async fn test_fill_stops_at_key_cap() {
    let cache = MockCache::new().with_cluster(
        "redis-a",
        MockClusterSpec::bounded(MIB, 100 * 1024 * MIB).with_policy("allkeys-lru"),
    );
    let mut client = cache_stress::cache::CacheConnector::connect(&cache, &cluster("redis-a"))
        .await
        .unwrap();

    let report = MemoryFiller::default()
        .fill(
            &mut client,
            "redis-a",
            "fis_stress:redis-a",
            FillPercentage::new(100).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(report.exit, FillExit::KeyCapReached);
    assert_eq!(report.written_keys.len(), MAX_STRESS_KEYS);
    assert_eq!(cache.set_calls("redis-a"), MAX_STRESS_KEYS);
    assert!(!report.ceiling.synthesized);
}

/// With LRU on a tiny ceiling the target is never reached; the first sampled
/// eviction is reported in the success line.
#[tokio::test]
async fn test_eviction_onset_reported_once() {
    let max_memory = 60 * KEY_COST + KEY_COST / 2;
    let cache = MockCache::new().with_cluster(
        "redis-a",
        MockClusterSpec::bounded(0, max_memory).with_policy("allkeys-lru"),
    );
    let filler = MemoryFiller::new(cache_stress::services::FillLimits {
        max_keys: 500,
        ..Default::default()
    });

    let response = handler(&cache)
        .with_filler(filler)
        .apply_stress(apply_request(&["redis-a"], 100))
        .await;

    assert_eq!(response.results.len(), 1);
    let line = &response.results[0];
    assert!(
        line.starts_with("Cluster redis-a: Created 500 keys"),
        "unexpected line {line}"
    );
    assert!(line.ends_with("evictions started at 100 keys"), "unexpected line {line}");
    assert!(cache.evicted_keys("redis-a") > 0);
}

/// Second cluster unreachable: three result lines, two stress records.
#[tokio::test]
async fn test_unreachable_cluster_does_not_stop_others() {
    let cache = MockCache::new()
        .with_cluster("redis-a", MockClusterSpec::bounded(0, 5 * MIB))
        .with_cluster("redis-c", MockClusterSpec::bounded(0, 5 * MIB));

    let response = handler(&cache)
        .apply_stress(apply_request(&["redis-a", "redis-b", "redis-c"], 40))
        .await;

    assert_eq!(response.results.len(), 3);
    assert_eq!(response.stress_keys.len(), 2);
    assert!(response.results[0].starts_with("Cluster redis-a: Created"));
    assert!(response.results[1]
        .starts_with("Failed to apply stress to cluster redis-b: Connection error"));
    assert!(response.results[2].starts_with("Cluster redis-c: Created"));

    let ids: Vec<&str> = response
        .stress_keys
        .iter()
        .map(|r| r.cluster.cluster_id.as_str())
        .collect();
    assert_eq!(ids, vec!["redis-a", "redis-c"]);
    assert_eq!(cache.connects(), vec!["redis-a", "redis-b", "redis-c"]);
}

/// A write failure mid-fill still hands back the keys written so far.
#[tokio::test]
async fn test_partial_fill_keeps_written_keys() {
    let cache = MockCache::new()
        .with_cluster("redis-a", MockClusterSpec::bounded(0, 50 * MIB))
        .with_failing_set_after("redis-a", 7);

    let response = handler(&cache)
        .apply_stress(apply_request(&["redis-a"], 90))
        .await;

    assert_eq!(
        response.results,
        vec!["Failed to apply stress to cluster redis-a: Redis error: Mock SET failure: connection reset by peer"]
    );
    assert_eq!(response.stress_keys.len(), 1);
    assert_eq!(response.stress_keys[0].keys.len(), 7);
    assert_eq!(cache.key_count("redis-a"), 7);
}

/// Policy setup is idempotent and the synthetic ceiling is written once.
#[tokio::test]
async fn test_policy_setup_is_idempotent() {
    let cache = MockCache::new().with_cluster("redis-a", MockClusterSpec::unbounded(10 * MIB));
    let handler = handler(&cache);

    handler.apply_stress(apply_request(&["redis-a"], 0)).await;
    handler.apply_stress(apply_request(&["redis-a"], 0)).await;

    assert_eq!(cache.policy("redis-a"), "allkeys-lru");
    assert_eq!(cache.max_memory("redis-a"), 110 * MIB);

    let config_sets = cache.config_sets("redis-a");
    let policy_sets = config_sets
        .iter()
        .filter(|(p, _)| p == "maxmemory-policy")
        .count();
    let ceiling_sets = config_sets.iter().filter(|(p, _)| p == "maxmemory").count();
    assert_eq!(policy_sets, 2);
    assert_eq!(ceiling_sets, 1);
    // 0% is reached before any write.
    assert_eq!(cache.set_calls("redis-a"), 0);
}

/// Telemetry failing after the overflow writes yields an error entry for that
/// cluster only.
#[tokio::test]
async fn test_eviction_check_failure_is_isolated() {
    let cache = MockCache::new()
        .with_cluster(
            "redis-a",
            MockClusterSpec::bounded(0, 100 * MIB).with_policy("allkeys-lru"),
        )
        .with_cluster("redis-b", MockClusterSpec::bounded(0, 100 * MIB))
        .with_failing_info_after("redis-b", 100);

    let request = StressKeysRequest {
        stress_keys: vec![
            StressRecord {
                cluster: cluster("redis-a"),
                keys: Vec::new(),
            },
            StressRecord {
                cluster: cluster("redis-b"),
                keys: Vec::new(),
            },
        ],
    };

    let results = handler(&cache).test_evictions(request).await;

    assert_eq!(results.len(), 2);
    match &results[0] {
        EvictionResult::Observed(observation) => {
            assert_eq!(observation.cluster_id, "redis-a");
            assert_eq!(observation.eviction_policy, "allkeys-lru");
            assert!((observation.max_memory_mb - 100.0).abs() < f64::EPSILON);
        }
        other => panic!("expected observation, got {other:?}"),
    }
    assert_eq!(
        results[1],
        EvictionResult::Failed {
            cluster_id: "redis-b".to_string(),
            error: "Redis error: Mock INFO failure: timed out".to_string(),
        }
    );
    assert_eq!(cache.set_calls("redis-b"), 100);
}

/// Cleanup removes named and overflow keys, and skips DEL for an empty list.
#[tokio::test]
async fn test_cleanup_removes_stress_and_overflow_keys() {
    let cache = MockCache::new()
        .with_cluster("redis-a", MockClusterSpec::unbounded(0))
        .with_cluster("redis-b", MockClusterSpec::unbounded(0))
        .with_key("redis-a", "fis_stress:redis-a:0", 10)
        .with_key("redis-a", "fis_stress:redis-a:1", 10)
        .with_key("redis-a", "eviction_test:redis-a:0", 10)
        .with_key("redis-a", "eviction_test:redis-ab:0", 10)
        .with_key("redis-a", "unrelated", 10);

    let request = StressKeysRequest {
        stress_keys: vec![
            StressRecord {
                cluster: cluster("redis-a"),
                keys: vec![
                    "fis_stress:redis-a:0".to_string(),
                    "fis_stress:redis-a:1".to_string(),
                    "fis_stress:redis-a:2".to_string(),
                ],
            },
            StressRecord {
                cluster: cluster("redis-b"),
                keys: Vec::new(),
            },
            StressRecord {
                cluster: cluster("redis-gone"),
                keys: vec!["fis_stress:redis-gone:0".to_string()],
            },
        ],
    };

    let results = handler(&cache).cleanup(request).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "Cluster redis-a: Deleted 3 total keys");
    assert_eq!(results[1], "Cluster redis-b: Deleted 0 total keys");
    assert!(results[2].starts_with("Failed to cleanup cluster redis-gone: Connection error"));

    assert!(cache.contains_key("redis-a", "unrelated"));
    assert!(cache.contains_key("redis-a", "eviction_test:redis-ab:0"));
    assert_eq!(cache.key_count("redis-a"), 2);
    assert_eq!(cache.delete_calls("redis-b"), 0);
}

/// Stress, eviction check and cleanup in sequence leave only pre-existing keys.
#[tokio::test]
async fn test_full_cycle_through_dispatch() -> Result<()> {
    let cache = MockCache::new()
        .with_cluster(
            "redis-a",
            MockClusterSpec::bounded(2 * MIB, 20 * MIB).with_policy("volatile-lru"),
        )
        .with_key("redis-a", "session:1", 100);
    let handler = handler(&cache);

    let applied = handler
        .dispatch(json!({
            "action": "apply_stress",
            "targetClusters": [serde_json::to_value(cluster("redis-a")).unwrap()],
            "memoryFillPercentage": "30",
            "durationMinutes": 0
        }))
        .await?;
    let applied: ApplyStressResponse = serde_json::from_value(applied)?;
    assert!(cache.used_memory("redis-a") >= 6 * MIB);

    let stress_keys = serde_json::to_value(&applied.stress_keys)?;

    let evictions = handler
        .dispatch(json!({"action": "test_evictions", "stressKeys": stress_keys.clone()}))
        .await?;
    assert_eq!(evictions.as_array().unwrap().len(), 1);
    assert_eq!(evictions[0]["eviction_policy"], "allkeys-lru");

    let cleaned = handler
        .dispatch(json!({"action": "cleanup", "stressKeys": stress_keys}))
        .await?;
    assert_eq!(cleaned.as_array().unwrap().len(), 1);

    assert_eq!(cache.key_count("redis-a"), 1);
    assert!(cache.contains_key("redis-a", "session:1"));
    Ok(())
}

#[tokio::test]
async fn test_dispatch_unknown_or_missing_action_returns_null() {
    let cache = MockCache::new();
    let handler = handler(&cache);

    assert_eq!(
        handler.dispatch(json!({"action": "reboot"})).await.unwrap(),
        Value::Null
    );
    assert_eq!(handler.dispatch(json!({})).await.unwrap(), Value::Null);
    assert!(cache.connects().is_empty());
}

#[tokio::test]
async fn test_dispatch_rejects_invalid_payload() {
    let cache = MockCache::new();
    let handler = handler(&cache);

    let out_of_range = handler
        .dispatch(json!({
            "action": "apply_stress",
            "targetClusters": [],
            "memoryFillPercentage": 120
        }))
        .await;
    assert!(matches!(out_of_range, Err(StressError::InvalidRequest(_))));

    let missing = handler.dispatch(json!({"action": "cleanup"})).await;
    assert!(matches!(missing, Err(StressError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_dispatch_find_clusters() {
    let directory = MockClusterDirectory::new()
        .with_redis_cluster("redis-a", &[("FIS-Target", "true")])
        .with_redis_cluster("redis-b", &[("FIS-Target", "false")]);
    let handler = StressHandler::new(MockCache::new(), directory, &Config::default());

    let found = handler
        .dispatch(json!({
            "action": "find_clusters",
            "tagKey": "FIS-Target",
            "tagValue": "true"
        }))
        .await
        .unwrap();

    assert_eq!(
        found,
        json!({
            "targetClusters": [{
                "cluster_id": "redis-a",
                "endpoint": "redis-a.cache.amazonaws.com",
                "port": 6379
            }]
        })
    );
}

#[tokio::test]
async fn test_find_clusters_listing_failure_fails_invocation() {
    let handler = StressHandler::new(
        MockCache::new(),
        MockClusterDirectory::failing(),
        &Config::default(),
    );
    let result = handler
        .dispatch(json!({"action": "find_clusters", "tagKey": "k", "tagValue": "v"}))
        .await;
    assert!(matches!(result, Err(StressError::Discovery(_))));
}

/// A zero key cap stops the loop before the first write.
#[tokio::test]
async fn test_zero_key_cap_writes_nothing() {
    let cache = MockCache::new().with_cluster("redis-a", MockClusterSpec::unbounded(10 * MIB));
    let mut client = cache_stress::cache::CacheConnector::connect(&cache, &cluster("redis-a"))
        .await
        .unwrap();
    let filler = MemoryFiller::new(cache_stress::services::FillLimits {
        max_keys: 0,
        ..Default::default()
    });

    let report = filler
        .fill(
            &mut client,
            "redis-a",
            "fis_stress:redis-a",
            FillPercentage::new(50).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(report.exit, FillExit::KeyCapReached);
    assert!(report.written_keys.is_empty());
    assert_eq!(cache.set_calls("redis-a"), 0);
    assert_eq!(cache.key_count("redis-a"), 0);
}

/// Fill outcomes, per-cluster failures and cleanup volume land in metrics.
#[test]
fn test_stress_and_cleanup_record_metrics() {
    let cache = MockCache::new()
        .with_cluster("redis-a", MockClusterSpec::bounded(0, 5 * MIB))
        .with_cluster("redis-c", MockClusterSpec::bounded(0, 50 * MIB))
        .with_failing_set_after("redis-c", 3);
    let handler = handler(&cache);

    let (response, snapshot) = capture_metrics_async(
        handler.apply_stress(apply_request(&["redis-a", "redis-b", "redis-c"], 40)),
    );

    assert_eq!(
        snapshot.counter("cache_stress_fills_total", &[("exit", "target_reached")]),
        1
    );
    assert_eq!(
        snapshot.counter("cache_stress_fills_total", &[("exit", "aborted")]),
        1
    );
    assert_eq!(
        snapshot.histogram("cache_stress_fill_keys_written", &[("exit", "aborted")]),
        vec![3.0]
    );
    // redis-b never connected, redis-c failed mid-fill.
    assert_eq!(
        snapshot.counter(
            "cache_stress_cluster_failures_total",
            &[("action", "apply_stress")]
        ),
        2
    );

    let written: usize = response.stress_keys.iter().map(|r| r.keys.len()).sum();
    let (_, snapshot) = capture_metrics_async(handler.cleanup(StressKeysRequest {
        stress_keys: response.stress_keys,
    }));

    assert_eq!(
        snapshot.counter("cache_stress_keys_deleted_total", &[]),
        written as u64
    );
    assert_eq!(
        snapshot.counter("cache_stress_cluster_failures_total", &[]),
        0
    );
}
