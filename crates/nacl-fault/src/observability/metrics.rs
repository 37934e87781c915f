//! Metric recording for inject and rollback.
//!
//! `status` is bounded to `success` and `error`.

use metrics::{counter, histogram};
use std::time::Duration;

/// Status label for a result.
#[must_use]
pub fn status_of<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

/// Record one inject invocation.
///
/// Metric: `nacl_fault_injections_total`, `nacl_fault_injection_duration_seconds`
/// Labels: `status`
pub fn record_injection(status: &'static str, duration: Duration) {
    counter!("nacl_fault_injections_total", "status" => status).increment(1);
    histogram!("nacl_fault_injection_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}

/// Record one rollback invocation.
///
/// Metric: `nacl_fault_rollbacks_total`, `nacl_fault_rollback_duration_seconds`
/// Labels: `status`
pub fn record_rollback(status: &'static str, duration: Duration) {
    counter!("nacl_fault_rollbacks_total", "status" => status).increment(1);
    histogram!("nacl_fault_rollback_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}

/// Record one association replaced with the chaos ACL.
///
/// Metric: `nacl_fault_association_switches_total`
/// Labels: `status`
pub fn record_association_switch(status: &'static str) {
    counter!("nacl_fault_association_switches_total", "status" => status).increment(1);
}

/// Record one association pointed back at its original ACL.
///
/// Metric: `nacl_fault_association_restores_total`
/// Labels: `status`
pub fn record_association_restore(status: &'static str) {
    counter!("nacl_fault_association_restores_total", "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::observability::testing::capture_metrics;

    #[test]
    fn test_status_of() {
        assert_eq!(status_of::<(), ()>(&Ok(())), "success");
        assert_eq!(status_of::<(), ()>(&Err(())), "error");
    }

    #[test]
    fn test_invocation_metrics() {
        let ((), snapshot) = capture_metrics(|| {
            record_injection("success", Duration::from_secs(6));
            record_rollback("error", Duration::from_millis(250));
            record_association_switch("success");
            record_association_restore("error");
        });

        assert_eq!(
            snapshot.counter("nacl_fault_injections_total", &[("status", "success")]),
            1
        );
        assert_eq!(
            snapshot.histogram("nacl_fault_injection_duration_seconds", &[]),
            vec![6.0]
        );
        assert_eq!(
            snapshot.histogram("nacl_fault_rollback_duration_seconds", &[("status", "error")]),
            vec![0.25]
        );
        assert_eq!(
            snapshot.counter("nacl_fault_association_switches_total", &[]),
            1
        );
        assert_eq!(
            snapshot.counter("nacl_fault_association_restores_total", &[("status", "error")]),
            1
        );
    }
}
