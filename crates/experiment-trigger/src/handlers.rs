//! Schedule and pipeline trigger handlers.

use crate::errors::TriggerError;
use crate::fis::ExperimentStarter;
use crate::models::{PipelineEvent, ScheduledEvent};
use crate::observability::metrics;
use crate::pipeline::PipelineJobReporter;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, instrument};

fn parse_event<T: DeserializeOwned>(event: Value) -> Result<T, TriggerError> {
    serde_json::from_value(event).map_err(|e| TriggerError::InvalidRequest(e.to_string()))
}

/// Starts one fixed template per scheduled event.
pub struct ScheduleHandler<S> {
    starter: S,
    template_id: String,
}

impl<S: ExperimentStarter> ScheduleHandler<S> {
    #[must_use]
    pub fn new(starter: S, template_id: impl Into<String>) -> Self {
        Self {
            starter,
            template_id: template_id.into(),
        }
    }

    /// Start the experiment with the event id as client token.
    ///
    /// A failed start is logged and swallowed so the scheduler does not
    /// retry into a second experiment.
    ///
    /// # Errors
    ///
    /// Only `InvalidRequest`, for an event without an `id`.
    #[instrument(skip_all, fields(template_id = %self.template_id))]
    pub async fn handle(&self, event: Value) -> Result<Value, TriggerError> {
        let event: ScheduledEvent = parse_event(event)?;

        let started = self
            .starter
            .start_experiment(&self.template_id, &event.id)
            .await;
        metrics::record_experiment_start(metrics::SCHEDULE_TRIGGER, metrics::status_of(&started));

        match started {
            Ok(experiment_id) => info!(
                target: "chaos.trigger.schedule",
                event_id = %event.id,
                experiment_id = %experiment_id,
                "Scheduled experiment started"
            ),
            Err(e) => error!(
                target: "chaos.trigger.schedule",
                event_id = %event.id,
                error = %e,
                "Scheduled experiment failed to start"
            ),
        }
        Ok(Value::Null)
    }
}

/// Starts the template named by a pipeline job and reports back to the job.
pub struct PipelineHandler<S, R> {
    starter: S,
    reporter: R,
}

impl<S: ExperimentStarter, R: PipelineJobReporter> PipelineHandler<S, R> {
    #[must_use]
    pub fn new(starter: S, reporter: R) -> Self {
        Self { starter, reporter }
    }

    /// Start the job's template with the job id as client token, then mark
    /// the job succeeded (with `experimentId`) or failed.
    ///
    /// A failed start and a rejected success report are handled alike: the
    /// job is marked failed with the error text and the request id as
    /// external execution id, so it never waits for its timeout.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a malformed job event, `Pipeline` if the failure
    /// result cannot be reported either.
    #[instrument(skip_all, fields(request_id = %request_id))]
    pub async fn handle(&self, event: Value, request_id: &str) -> Result<Value, TriggerError> {
        let event: PipelineEvent = parse_event(event)?;
        let job_id = event.job_id();
        let template_id = event.template_id();

        if let Err(e) = self.start_and_report(job_id, template_id).await {
            error!(
                target: "chaos.trigger.pipeline",
                job_id = %job_id,
                template_id = %template_id,
                error = %e,
                "Pipeline job failed, reporting failure"
            );
            let reported = self
                .reporter
                .report_failure(job_id, &e.to_string(), request_id)
                .await;
            metrics::record_job_report("failure", metrics::status_of(&reported));
            reported?;
        }
        Ok(Value::Null)
    }

    async fn start_and_report(&self, job_id: &str, template_id: &str) -> Result<(), TriggerError> {
        let started = self.starter.start_experiment(template_id, job_id).await;
        metrics::record_experiment_start(metrics::PIPELINE_TRIGGER, metrics::status_of(&started));
        let experiment_id = started?;

        info!(
            target: "chaos.trigger.pipeline",
            job_id = %job_id,
            experiment_id = %experiment_id,
            "Pipeline experiment started"
        );

        let reported = self.reporter.report_success(job_id, &experiment_id).await;
        metrics::record_job_report("success", metrics::status_of(&reported));
        reported
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::fis::mock::MockExperimentStarter;
    use crate::pipeline::mock::{JobReport, MockJobReporter};
    use common::observability::testing::capture_metrics_async;
    use serde_json::json;

    fn pipeline_event(job_id: &str, template_id: &str) -> Value {
        json!({
            "CodePipeline.job": {
                "id": job_id,
                "data": {
                    "actionConfiguration": {
                        "configuration": { "UserParameters": template_id }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_schedule_uses_event_id_as_client_token() {
        let handler = ScheduleHandler::new(MockExperimentStarter::starting("EXP1"), "EXT1");

        let response = handler.handle(json!({"id": "evt-42"})).await.unwrap();

        assert_eq!(response, Value::Null);
        assert_eq!(
            handler.starter.calls(),
            vec![("EXT1".to_string(), "evt-42".to_string())]
        );
    }

    #[tokio::test]
    async fn test_schedule_swallows_start_failure() {
        let handler = ScheduleHandler::new(MockExperimentStarter::failing(), "EXT1");
        assert!(handler.handle(json!({"id": "evt-42"})).await.is_ok());
        assert_eq!(handler.starter.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_rejects_event_without_id() {
        let handler = ScheduleHandler::new(MockExperimentStarter::starting("EXP1"), "EXT1");
        let result = handler.handle(json!({"source": "aws.events"})).await;
        assert!(matches!(result, Err(TriggerError::InvalidRequest(_))));
        assert!(handler.starter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_reports_success_with_experiment_id() {
        let handler = PipelineHandler::new(
            MockExperimentStarter::starting("EXPabc"),
            MockJobReporter::new(),
        );

        handler
            .handle(pipeline_event("job-1", "EXT9"), "req-1")
            .await
            .unwrap();

        assert_eq!(
            handler.starter.calls(),
            vec![("EXT9".to_string(), "job-1".to_string())]
        );
        assert_eq!(
            handler.reporter.reports(),
            vec![JobReport::Success {
                job_id: "job-1".to_string(),
                experiment_id: "EXPabc".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_pipeline_reports_failure_with_request_id() {
        let handler =
            PipelineHandler::new(MockExperimentStarter::failing(), MockJobReporter::new());

        handler
            .handle(pipeline_event("job-2", "EXT9"), "req-7")
            .await
            .unwrap();

        let reports = handler.reporter.reports();
        assert_eq!(reports.len(), 1);
        match &reports[0] {
            JobReport::Failure {
                job_id,
                message,
                external_execution_id,
            } => {
                assert_eq!(job_id, "job-2");
                assert!(message.contains("template not found"));
                assert_eq!(external_execution_id, "req-7");
            }
            other => panic!("expected failure report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_success_report_falls_back_to_failure() {
        let handler = PipelineHandler::new(
            MockExperimentStarter::starting("EXPabc"),
            MockJobReporter::failing_success(),
        );

        handler
            .handle(pipeline_event("job-5", "EXT9"), "req-9")
            .await
            .unwrap();

        assert_eq!(handler.reporter.rejected(), 1);
        assert_eq!(
            handler.reporter.reports(),
            vec![JobReport::Failure {
                job_id: "job-5".to_string(),
                message: "CodePipeline error: Mock CodePipeline error".to_string(),
                external_execution_id: "req-9".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_pipeline_fails_when_no_result_can_be_reported() {
        let handler = PipelineHandler::new(
            MockExperimentStarter::starting("EXPabc"),
            MockJobReporter::failing(),
        );
        let result = handler.handle(pipeline_event("job-3", "EXT9"), "req-1").await;

        assert!(matches!(result, Err(TriggerError::Pipeline(_))));
        // Success was rejected, then the fallback failure report too.
        assert_eq!(handler.reporter.rejected(), 2);
        assert!(handler.reporter.reports().is_empty());
    }

    #[test]
    fn test_pipeline_records_start_and_report_metrics() {
        let handler = PipelineHandler::new(
            MockExperimentStarter::starting("EXPabc"),
            MockJobReporter::failing_success(),
        );

        let (result, snapshot) =
            capture_metrics_async(handler.handle(pipeline_event("job-6", "EXT9"), "req-2"));

        assert!(result.is_ok());
        assert_eq!(
            snapshot.counter(
                "experiment_trigger_starts_total",
                &[("trigger", "pipeline"), ("status", "success")]
            ),
            1
        );
        assert_eq!(
            snapshot.counter(
                "experiment_trigger_job_reports_total",
                &[("result", "success"), ("status", "error")]
            ),
            1
        );
        assert_eq!(
            snapshot.counter(
                "experiment_trigger_job_reports_total",
                &[("result", "failure"), ("status", "success")]
            ),
            1
        );
    }

    #[test]
    fn test_schedule_records_failed_start() {
        let handler = ScheduleHandler::new(MockExperimentStarter::failing(), "EXT1");

        let (result, snapshot) = capture_metrics_async(handler.handle(json!({"id": "evt-1"})));

        assert!(result.is_ok());
        assert_eq!(
            snapshot.counter(
                "experiment_trigger_starts_total",
                &[("trigger", "schedule"), ("status", "error")]
            ),
            1
        );
    }

    #[tokio::test]
    async fn test_pipeline_rejects_malformed_job() {
        let handler = PipelineHandler::new(
            MockExperimentStarter::starting("EXPabc"),
            MockJobReporter::new(),
        );
        let result = handler.handle(json!({"CodePipeline.job": {"id": "job-4"}}), "req-1").await;
        assert!(matches!(result, Err(TriggerError::InvalidRequest(_))));
        assert!(handler.reporter.reports().is_empty());
    }
}
