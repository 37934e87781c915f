//! Observability for the cache stress function.
//!
//! Tracing is installed by `common::observability`; this module holds the
//! counters and histograms. Without an installed recorder the `metrics`
//! facade is a no-op, so recording is always safe.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `cache_stress_fills_total` | Counter | `exit` | Fill loops by exit reason |
//! | `cache_stress_fill_keys_written` | Histogram | `exit` | Keys written per fill |
//! | `cache_stress_eviction_onset_keys` | Histogram | none | Key count at first observed eviction |
//! | `cache_stress_maxmemory_overrides_total` | Counter | none | Synthetic `maxmemory` ceilings written |
//! | `cache_stress_cluster_failures_total` | Counter | `action` | Per-cluster failures |
//! | `cache_stress_keys_deleted_total` | Counter | none | Keys removed by cleanup |

pub mod metrics;
