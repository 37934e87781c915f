//! Metric recording for the stress stages.
//!
//! Labels are bounded:
//! - `exit`: `target_reached`, `key_cap_reached`, `aborted`
//! - `action`: `apply_stress`, `test_evictions`, `cleanup`

use metrics::{counter, histogram};

/// Exit label for a fill that failed part-way.
pub const FILL_ABORTED: &str = "aborted";

/// Record one finished fill loop.
///
/// Metric: `cache_stress_fills_total`, `cache_stress_fill_keys_written`
/// Labels: `exit`
#[allow(clippy::cast_precision_loss)]
pub fn record_fill(exit: &'static str, keys_written: usize) {
    counter!("cache_stress_fills_total", "exit" => exit).increment(1);
    histogram!("cache_stress_fill_keys_written", "exit" => exit).record(keys_written as f64);
}

/// Record the key count at which evictions were first sampled.
///
/// Metric: `cache_stress_eviction_onset_keys`
#[allow(clippy::cast_precision_loss)]
pub fn record_eviction_onset(keys_written: usize) {
    histogram!("cache_stress_eviction_onset_keys").record(keys_written as f64);
}

/// Record a synthetic `maxmemory` written to an unbounded target.
///
/// Metric: `cache_stress_maxmemory_overrides_total`
pub fn record_memory_ceiling_synthesized() {
    counter!("cache_stress_maxmemory_overrides_total").increment(1);
}

/// Record a cluster that failed one action.
///
/// Metric: `cache_stress_cluster_failures_total`
/// Labels: `action`
pub fn record_cluster_failure(action: &'static str) {
    counter!("cache_stress_cluster_failures_total", "action" => action).increment(1);
}

/// Record keys removed by cleanup.
///
/// Metric: `cache_stress_keys_deleted_total`
pub fn record_keys_deleted(deleted: u64) {
    counter!("cache_stress_keys_deleted_total").increment(deleted);
}
