//! Experiment trigger configuration.

use common::config::{self as env_config, ConfigError};
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub region: String,

    /// Template started by the scheduled trigger. The pipeline trigger reads
    /// its template from the job instead.
    pub experiment_template_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Config {
            region: env_config::region(vars),
            experiment_template_id: env_config::required(vars, "EXPERIMENT_TEMPLATE_ID").ok(),
        })
    }

    /// The configured template id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `EXPERIMENT_TEMPLATE_ID` is
    /// unset.
    pub fn require_template_id(&self) -> Result<&str, ConfigError> {
        self.experiment_template_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("EXPERIMENT_TEMPLATE_ID".to_string()))
    }
}
