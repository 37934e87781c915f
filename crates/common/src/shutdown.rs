//! Process shutdown signals.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Resolves when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!(target: "chaos.shutdown", "Received SIGINT"),
            Err(e) => error!(target: "chaos.shutdown", error = %e, "Failed to listen for SIGINT"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!(target: "chaos.shutdown", "Received SIGTERM");
            }
            Err(e) => {
                error!(target: "chaos.shutdown", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Spawn a task that cancels `token` on the first shutdown signal.
///
/// The returned token is a child of `token`'s tree, so cancelling it
/// directly never affects callers holding the parent.
#[must_use]
pub fn cancel_on_shutdown(token: &CancellationToken) -> CancellationToken {
    let child = token.child_token();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => {
                info!(target: "chaos.shutdown", "Cancelling in-flight waits");
                trigger.cancel();
            }
            () = trigger.cancelled() => {}
        }
    });
    child
}
