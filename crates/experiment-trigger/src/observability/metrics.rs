//! Metric recording for experiment starts and job reports.
//!
//! Labels are bounded:
//! - `trigger`: `schedule`, `pipeline`
//! - `result`: `success`, `failure` (the job result being reported)
//! - `status`: `success`, `error` (whether the call itself worked)

use metrics::counter;

pub const SCHEDULE_TRIGGER: &str = "schedule";
pub const PIPELINE_TRIGGER: &str = "pipeline";

/// Status label for a result.
#[must_use]
pub fn status_of<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

/// Record one `StartExperiment` attempt.
///
/// Metric: `experiment_trigger_starts_total`
/// Labels: `trigger`, `status`
pub fn record_experiment_start(trigger: &'static str, status: &'static str) {
    counter!("experiment_trigger_starts_total", "trigger" => trigger, "status" => status)
        .increment(1);
}

/// Record one `PutJobSuccessResult` / `PutJobFailureResult` call.
///
/// Metric: `experiment_trigger_job_reports_total`
/// Labels: `result`, `status`
pub fn record_job_report(result: &'static str, status: &'static str) {
    counter!("experiment_trigger_job_reports_total", "result" => result, "status" => status)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::observability::testing::capture_metrics;

    #[test]
    fn test_start_and_report_counters() {
        let ((), snapshot) = capture_metrics(|| {
            record_experiment_start(SCHEDULE_TRIGGER, "success");
            record_experiment_start(PIPELINE_TRIGGER, "error");
            record_job_report("failure", status_of::<(), ()>(&Ok(())));
        });

        assert_eq!(
            snapshot.counter(
                "experiment_trigger_starts_total",
                &[("trigger", "pipeline"), ("status", "error")]
            ),
            1
        );
        assert_eq!(snapshot.counter("experiment_trigger_starts_total", &[]), 2);
        assert_eq!(
            snapshot.counter(
                "experiment_trigger_job_reports_total",
                &[("result", "failure"), ("status", "success")]
            ),
            1
        );
    }
}
