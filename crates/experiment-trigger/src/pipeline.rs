//! Pipeline job result reporting (CodePipeline).

use crate::errors::TriggerError;
use aws_config::SdkConfig;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{FailureDetails, FailureType};
use aws_sdk_codepipeline::Client;
use tracing::instrument;

/// Output variable carrying the started experiment id.
pub const EXPERIMENT_ID_VARIABLE: &str = "experimentId";

/// Reports the outcome of a pipeline job (enables mocking).
#[async_trait::async_trait]
pub trait PipelineJobReporter: Send + Sync {
    /// `PutJobSuccessResult` with `experimentId` as output variable.
    async fn report_success(&self, job_id: &str, experiment_id: &str)
        -> Result<(), TriggerError>;

    /// `PutJobFailureResult` of type `JobFailed`.
    async fn report_failure(
        &self,
        job_id: &str,
        message: &str,
        external_execution_id: &str,
    ) -> Result<(), TriggerError>;
}

/// [`PipelineJobReporter`] backed by the CodePipeline API.
#[derive(Debug, Clone)]
pub struct CodePipelineReporter {
    client: Client,
}

impl CodePipelineReporter {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl PipelineJobReporter for CodePipelineReporter {
    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn report_success(
        &self,
        job_id: &str,
        experiment_id: &str,
    ) -> Result<(), TriggerError> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .output_variables(EXPERIMENT_ID_VARIABLE, experiment_id)
            .send()
            .await
            .map_err(|e| {
                TriggerError::Pipeline(format!(
                    "PutJobSuccessResult failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn report_failure(
        &self,
        job_id: &str,
        message: &str,
        external_execution_id: &str,
    ) -> Result<(), TriggerError> {
        let details = FailureDetails::builder()
            .r#type(FailureType::JobFailed)
            .message(message)
            .external_execution_id(external_execution_id)
            .build()
            .map_err(|e| TriggerError::Pipeline(format!("invalid failure details: {e}")))?;

        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map_err(|e| {
                TriggerError::Pipeline(format!(
                    "PutJobFailureResult failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

/// Mock reporter for unit testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A recorded report.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum JobReport {
        Success {
            job_id: String,
            experiment_id: String,
        },
        Failure {
            job_id: String,
            message: String,
            external_execution_id: String,
        },
    }

    /// Records accepted reports. Rejected calls are counted in
    /// [`MockJobReporter::rejected`] but not recorded.
    #[derive(Default)]
    pub struct MockJobReporter {
        reject_success: bool,
        reject_failure: bool,
        reports: Mutex<Vec<JobReport>>,
        rejected: AtomicUsize,
    }

    impl MockJobReporter {
        pub fn new() -> Self {
            Self::default()
        }

        /// A mock whose every report call fails.
        pub fn failing() -> Self {
            Self {
                reject_success: true,
                reject_failure: true,
                ..Self::default()
            }
        }

        /// A mock that rejects `PutJobSuccessResult` but accepts
        /// `PutJobFailureResult`.
        pub fn failing_success() -> Self {
            Self {
                reject_success: true,
                ..Self::default()
            }
        }

        pub fn reports(&self) -> Vec<JobReport> {
            self.reports.lock().map(|r| r.clone()).unwrap_or_default()
        }

        pub fn rejected(&self) -> usize {
            self.rejected.load(Ordering::SeqCst)
        }

        fn record(&self, report: JobReport) -> Result<(), TriggerError> {
            let reject = match report {
                JobReport::Success { .. } => self.reject_success,
                JobReport::Failure { .. } => self.reject_failure,
            };
            if reject {
                self.rejected.fetch_add(1, Ordering::SeqCst);
                return Err(TriggerError::Pipeline("Mock CodePipeline error".to_string()));
            }
            if let Ok(mut reports) = self.reports.lock() {
                reports.push(report);
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl PipelineJobReporter for MockJobReporter {
        async fn report_success(
            &self,
            job_id: &str,
            experiment_id: &str,
        ) -> Result<(), TriggerError> {
            self.record(JobReport::Success {
                job_id: job_id.to_string(),
                experiment_id: experiment_id.to_string(),
            })
        }

        async fn report_failure(
            &self,
            job_id: &str,
            message: &str,
            external_execution_id: &str,
        ) -> Result<(), TriggerError> {
            self.record(JobReport::Failure {
                job_id: job_id.to_string(),
                message: message.to_string(),
                external_execution_id: external_execution_id.to_string(),
            })
        }
    }
}
