//! Observability for the experiment triggers.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `experiment_trigger_starts_total` | Counter | `trigger`, `status` | Experiment start attempts |
//! | `experiment_trigger_job_reports_total` | Counter | `result`, `status` | Pipeline job results reported |

pub mod metrics;
