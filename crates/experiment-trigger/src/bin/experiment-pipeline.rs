//! Pipeline experiment trigger Lambda entry point.

use common::aws::load_sdk_config;
use common::config::ObservabilityConfig;
use common::observability::{init_tracing, invocation_span};
use experiment_trigger::config::Config;
use experiment_trigger::fis::FisExperimentStarter;
use experiment_trigger::handlers::PipelineHandler;
use experiment_trigger::pipeline::CodePipelineReporter;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(&ObservabilityConfig::from_env());

    let config = Config::from_env()?;
    info!(target: "chaos.trigger", config = ?config, "Starting experiment-pipeline function");

    let sdk_config = load_sdk_config(Some(&config.region)).await;
    let handler = Arc::new(PipelineHandler::new(
        FisExperimentStarter::new(&sdk_config),
        CodePipelineReporter::new(&sdk_config),
    ));

    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move {
            let request_id = event.context.request_id.clone();
            let span = invocation_span("experiment-pipeline", &request_id);
            let response = handler
                .handle(event.payload, &request_id)
                .instrument(span)
                .await?;
            Ok::<Value, Error>(response)
        }
    }))
    .await
}
