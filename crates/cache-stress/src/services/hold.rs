//! Post-stress hold.
//!
//! Keeps the injected pressure in place for the requested duration. The wait
//! is a timer raced against a cancellation token; nothing cancels it during
//! normal operation, only a runtime shutdown signal does.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// How a hold ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// The full duration elapsed (or no hold was requested).
    Completed,
    /// The token was cancelled before the duration elapsed.
    Cancelled,
}

/// Wait `duration`, or until `cancel` fires.
#[instrument(skip_all, fields(duration_secs = duration.as_secs()))]
pub async fn hold_stress(duration: Duration, cancel: &CancellationToken) -> HoldOutcome {
    if duration.is_zero() {
        return HoldOutcome::Completed;
    }

    info!(
        target: "chaos.cache.hold",
        duration_secs = duration.as_secs(),
        "Maintaining stress"
    );

    tokio::select! {
        () = tokio::time::sleep(duration) => {
            info!(target: "chaos.cache.hold", "Hold duration complete");
            HoldOutcome::Completed
        }
        () = cancel.cancelled() => {
            warn!(target: "chaos.cache.hold", "Hold cancelled before duration elapsed");
            HoldOutcome::Cancelled
        }
    }
}
