//! Metric assertions for tests.
//!
//! [`capture_metrics`] runs a closure with a thread-local
//! `DebuggingRecorder` installed, so tests running in parallel never see
//! each other's counters. Async code has to finish on the capturing thread;
//! [`capture_metrics_async`] drives it on a current-thread runtime.
//!
//! ```rust,ignore
//! use common::observability::testing::capture_metrics;
//!
//! let ((), snapshot) = capture_metrics(|| {
//!     metrics::counter!("demo_total", "status" => "ok").increment(2);
//! });
//! assert_eq!(snapshot.counter("demo_total", &[("status", "ok")]), 2);
//! ```

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::MetricKind;
use std::future::Future;

#[derive(Debug)]
struct MetricEntry {
    kind: MetricKind,
    name: String,
    labels: Vec<(String, String)>,
    value: DebugValue,
}

impl MetricEntry {
    fn matches(&self, kind: MetricKind, name: &str, labels: &[(&str, &str)]) -> bool {
        self.kind == kind
            && self.name == name
            && labels
                .iter()
                .all(|(k, v)| self.labels.iter().any(|(lk, lv)| lk == k && lv == v))
    }
}

/// Everything recorded during one capture.
#[derive(Debug)]
pub struct MetricSnapshot {
    entries: Vec<MetricEntry>,
}

impl MetricSnapshot {
    /// Sum of every counter named `name` whose labels include `labels`.
    #[must_use]
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.matches(MetricKind::Counter, name, labels))
            .map(|e| match &e.value {
                DebugValue::Counter(v) => *v,
                _ => 0,
            })
            .sum()
    }

    /// All samples of histogram `name` whose labels include `labels`.
    #[must_use]
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.entries
            .iter()
            .filter(|e| e.matches(MetricKind::Histogram, name, labels))
            .flat_map(|e| match &e.value {
                DebugValue::Histogram(samples) => samples.iter().map(|s| s.0).collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Names of everything recorded, sorted and deduplicated.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Run `f` with a fresh thread-local recorder and return what it recorded.
pub fn capture_metrics<T>(f: impl FnOnce() -> T) -> (T, MetricSnapshot) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let output = metrics::with_local_recorder(&recorder, f);

    let entries = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite, _unit, _description, value)| {
            let (kind, key) = composite.into_parts();
            MetricEntry {
                kind,
                name: key.name().to_string(),
                labels: key
                    .labels()
                    .map(|l| (l.key().to_string(), l.value().to_string()))
                    .collect(),
                value,
            }
        })
        .collect();

    (output, MetricSnapshot { entries })
}

/// [`capture_metrics`] for a future, polled to completion on a
/// current-thread runtime owned by the capture.
///
/// # Panics
///
/// If the runtime cannot be built. Test-only.
#[allow(clippy::expect_used)]
pub fn capture_metrics_async<F: Future>(future: F) -> (F::Output, MetricSnapshot) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("current-thread runtime");
    capture_metrics(|| runtime.block_on(future))
}
