//! Cache stress error types.
//!
//! Per-cluster failures (`Connection`, `Redis`) are caught by the handler and
//! rendered into the result payload. Request-level failures
//! (`InvalidRequest`, `Serialization`) fail the whole invocation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StressError {
    /// Could not open a connection to the target.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A Redis command failed.
    #[error("Redis error: {0}")]
    Redis(String),

    /// ElastiCache control-plane call failed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// The invocation payload is missing fields or out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StressError {
    /// True for errors scoped to one cluster, which must not abort the
    /// remaining clusters of an invocation.
    #[must_use]
    pub fn is_per_cluster(&self) -> bool {
        matches!(self, StressError::Connection(_) | StressError::Redis(_))
    }
}

impl From<common::config::ConfigError> for StressError {
    fn from(err: common::config::ConfigError) -> Self {
        StressError::Config(err.to_string())
    }
}
