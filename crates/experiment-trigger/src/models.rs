//! Trigger events.

use serde::Deserialize;

/// Scheduler (EventBridge) event. Only the event id is used, as the
/// idempotency token of the experiment start.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledEvent {
    pub id: String,
}

/// CodePipeline invoke-action event.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineJob {
    pub id: String,
    pub data: PipelineJobData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJobData {
    pub action_configuration: ActionConfiguration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfiguration {
    pub configuration: ActionParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionParameters {
    /// The experiment template id, set as the action's user parameters.
    #[serde(rename = "UserParameters")]
    pub user_parameters: String,
}

impl PipelineEvent {
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job.id
    }

    #[must_use]
    pub fn template_id(&self) -> &str {
        self.job.data.action_configuration.configuration.user_parameters.trim()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_event_shape() {
        let event: PipelineEvent = serde_json::from_value(json!({
            "CodePipeline.job": {
                "id": "11111111-abcd-1111-abcd-111111abcdef",
                "accountId": "111111111111",
                "data": {
                    "actionConfiguration": {
                        "configuration": {
                            "FunctionName": "experiment-pipeline",
                            "UserParameters": "EXT1a2b3c4d\n"
                        }
                    },
                    "inputArtifacts": []
                }
            }
        }))
        .unwrap();

        assert_eq!(event.job_id(), "11111111-abcd-1111-abcd-111111abcdef");
        assert_eq!(event.template_id(), "EXT1a2b3c4d");
    }

    #[test]
    fn test_scheduled_event_ignores_extra_fields() {
        let event: ScheduledEvent = serde_json::from_value(json!({
            "id": "cdc73f9d-aea9-11e3-9d5a-835b769c0d9c",
            "detail-type": "Scheduled Event",
            "source": "aws.events",
            "detail": {}
        }))
        .unwrap();
        assert_eq!(event.id, "cdc73f9d-aea9-11e3-9d5a-835b769c0d9c");
    }
}
