//! Experiment start (FIS).

use crate::errors::TriggerError;
use aws_config::SdkConfig;
use aws_sdk_fis::error::DisplayErrorContext;
use aws_sdk_fis::Client;
use tracing::{info, instrument};

/// Starts experiments from templates (enables mocking).
#[async_trait::async_trait]
pub trait ExperimentStarter: Send + Sync {
    /// Start `template_id`; `client_token` makes retries idempotent.
    /// Returns the experiment id.
    async fn start_experiment(
        &self,
        template_id: &str,
        client_token: &str,
    ) -> Result<String, TriggerError>;
}

/// [`ExperimentStarter`] backed by the FIS API.
#[derive(Debug, Clone)]
pub struct FisExperimentStarter {
    client: Client,
}

impl FisExperimentStarter {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl ExperimentStarter for FisExperimentStarter {
    #[instrument(skip_all, fields(template_id = %template_id))]
    async fn start_experiment(
        &self,
        template_id: &str,
        client_token: &str,
    ) -> Result<String, TriggerError> {
        let output = self
            .client
            .start_experiment()
            .experiment_template_id(template_id)
            .client_token(client_token)
            .send()
            .await
            .map_err(|e| {
                TriggerError::Fis(format!(
                    "StartExperiment failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let experiment_id = output
            .experiment()
            .and_then(|experiment| experiment.id())
            .map(str::to_string)
            .ok_or_else(|| {
                TriggerError::Fis("StartExperiment returned no experiment id".to_string())
            })?;

        info!(
            target: "chaos.trigger.fis",
            template_id = %template_id,
            experiment_id = %experiment_id,
            "Experiment started"
        );
        Ok(experiment_id)
    }
}

/// Mock starter for unit testing.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    pub struct MockExperimentStarter {
        experiment_id: String,
        return_error: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockExperimentStarter {
        /// A mock that starts every experiment as `experiment_id`.
        pub fn starting(experiment_id: &str) -> Self {
            Self {
                experiment_id: experiment_id.to_string(),
                return_error: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// A mock whose every start fails.
        pub fn failing() -> Self {
            Self {
                experiment_id: String::new(),
                return_error: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// `(template_id, client_token)` of every call so far.
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl ExperimentStarter for MockExperimentStarter {
        async fn start_experiment(
            &self,
            template_id: &str,
            client_token: &str,
        ) -> Result<String, TriggerError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((template_id.to_string(), client_token.to_string()));
            }
            if self.return_error {
                return Err(TriggerError::Fis(
                    "ResourceNotFoundException: template not found".to_string(),
                ));
            }
            Ok(self.experiment_id.clone())
        }
    }
}
