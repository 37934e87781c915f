//! Network isolation rollback Lambda entry point.

use common::aws::load_sdk_config;
use common::config::ObservabilityConfig;
use common::observability::{init_tracing, invocation_span};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use nacl_fault::config::Config;
use nacl_fault::ec2::SdkEc2Connector;
use nacl_fault::handlers::FaultHandler;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(&ObservabilityConfig::from_env());

    let config = Config::from_env()?;
    info!(target: "chaos.nacl", config = ?config, "Starting nacl-rollback function");

    let sdk_config = load_sdk_config(Some(&config.region)).await;
    let handler = Arc::new(FaultHandler::new(SdkEc2Connector::new(&sdk_config), &config));

    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move {
            let span = invocation_span("nacl-rollback", &event.context.request_id);
            let response = handler.handle_rollback(event.payload).instrument(span).await?;
            Ok::<Value, Error>(response)
        }
    }))
    .await
}
