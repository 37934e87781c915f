//! Cache stress Lambda entry point.
//!
//! Startup:
//! 1. Install the tracing subscriber
//! 2. Load configuration from environment
//! 3. Load the AWS SDK configuration for cluster discovery
//! 4. Arm the shutdown listener that cancels the stress hold
//! 5. Serve invocations, each inside its own request span

use cache_stress::cache::RedisConnector;
use cache_stress::config::Config;
use cache_stress::handlers::StressHandler;
use cache_stress::services::ElastiCacheDirectory;
use common::aws::load_sdk_config;
use common::config::ObservabilityConfig;
use common::observability::{init_tracing, invocation_span};
use common::shutdown::cancel_on_shutdown;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(&ObservabilityConfig::from_env());

    let config = Config::from_env()?;
    info!(target: "chaos.cache", config = ?config, "Starting cache stress function");

    let sdk_config = load_sdk_config(Some(&config.region)).await;
    let shutdown = cancel_on_shutdown(&CancellationToken::new());

    let handler = Arc::new(
        StressHandler::new(
            RedisConnector::from_config(&config),
            ElastiCacheDirectory::new(&sdk_config),
            &config,
        )
        .with_shutdown(shutdown),
    );

    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move {
            let span = invocation_span("cache-stress", &event.context.request_id);
            let response = handler.dispatch(event.payload).instrument(span).await?;
            Ok::<Value, Error>(response)
        }
    }))
    .await
}
