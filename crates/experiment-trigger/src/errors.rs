//! Experiment trigger error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    /// `StartExperiment` failed.
    #[error("FIS error: {0}")]
    Fis(String),

    /// Reporting the job result to CodePipeline failed.
    #[error("CodePipeline error: {0}")]
    Pipeline(String),

    /// The event is missing fields or malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<common::config::ConfigError> for TriggerError {
    fn from(err: common::config::ConfigError) -> Self {
        TriggerError::Config(err.to_string())
    }
}
