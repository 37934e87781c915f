//! Network ACL fault error types.
//!
//! Every EC2 failure is fatal for the invocation; nothing is retried or
//! aggregated on this path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaultError {
    /// An EC2 control-plane call failed.
    #[error("EC2 error: {0}")]
    Ec2(String),

    /// The invocation payload is missing fields or malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The rollback record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<common::config::ConfigError> for FaultError {
    fn from(err: common::config::ConfigError) -> Self {
        FaultError::Config(err.to_string())
    }
}
