//! Tracing setup.
//!
//! The subscriber is installed once per process by `main`. Nothing in the
//! library crates holds a logger object: each Lambda invocation runs inside
//! the span returned by [`invocation_span`], so every event a stage emits is
//! tagged with the function and request id of the invocation that caused it.

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use crate::config::{LogFormat, ObservabilityConfig};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored (warm Lambda
/// containers and tests may both hit this path).
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    // Lambda already timestamps every line it ships to CloudWatch.
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Create the span a single invocation runs in.
#[must_use]
pub fn invocation_span(function: &'static str, request_id: &str) -> Span {
    tracing::info_span!("invocation", function = function, request_id = %request_id)
}
