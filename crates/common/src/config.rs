//! Environment-driven configuration shared by every function.
//!
//! Each crate loads its own `Config` with `from_env()`, which delegates to a
//! `from_vars(&HashMap)` constructor so tests never touch the process
//! environment. The helpers here keep parsing rules identical across crates.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Default `EnvFilter` directive when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str =
    "chaos=info,cache_stress=info,nacl_fault=info,experiment_trigger=info";

/// Default AWS region when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event (CloudWatch friendly).
    Json,
    /// Human-readable `fmt` output for local runs.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" | "plain" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue(format!(
                "LOG_FORMAT must be json or pretty, got {other}"
            ))),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive (from `RUST_LOG`).
    pub log_filter: String,
    /// Output format (from `LOG_FORMAT`, default JSON).
    pub log_format: LogFormat,
}

impl ObservabilityConfig {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load from a `HashMap` (for testing). Unknown formats fall back to JSON.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_filter = vars
            .get("RUST_LOG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_format = vars
            .get("LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Json);

        Self {
            log_filter,
            log_format,
        }
    }
}

/// Read a required variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the variable is absent or blank.
pub fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Parse an optional variable, falling back to `default` when absent.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the variable is present but does
/// not parse.
pub fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{name}={raw}"))),
    }
}

/// Parse a boolean flag (`true/false/1/0/yes/no`), falling back to `default`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for any other spelling.
pub fn flag_or(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(format!("{name}={v}"))),
        },
    }
}

/// AWS region from `AWS_REGION`, defaulting to [`DEFAULT_REGION`].
#[must_use]
pub fn region(vars: &HashMap<String, String>) -> String {
    vars.get("AWS_REGION")
        .cloned()
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_observability_defaults() {
        let config = ObservabilityConfig::from_vars(&HashMap::new());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_observability_custom_values() {
        let config = ObservabilityConfig::from_vars(&vars(&[
            ("RUST_LOG", "debug"),
            ("LOG_FORMAT", "pretty"),
        ]));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_log_format_falls_back_to_json() {
        let config = ObservabilityConfig::from_vars(&vars(&[("LOG_FORMAT", "xml")]));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        let v = vars(&[("BLANK", "  ")]);
        assert_eq!(
            required(&v, "ABSENT"),
            Err(ConfigError::MissingEnvVar("ABSENT".to_string()))
        );
        assert!(matches!(
            required(&v, "BLANK"),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_parse_or() {
        let v = vars(&[("GOOD", "42"), ("BAD", "forty-two")]);
        assert_eq!(parse_or(&v, "GOOD", 5u64).unwrap(), 42);
        assert_eq!(parse_or(&v, "ABSENT", 5u64).unwrap(), 5);
        assert!(matches!(
            parse_or(&v, "BAD", 5u64),
            Err(ConfigError::InvalidValue(msg)) if msg == "BAD=forty-two"
        ));
    }

    #[test]
    fn test_flag_or() {
        let v = vars(&[("ON", "TRUE"), ("OFF", "0"), ("ODD", "maybe")]);
        assert!(flag_or(&v, "ON", false).unwrap());
        assert!(!flag_or(&v, "OFF", true).unwrap());
        assert!(flag_or(&v, "ABSENT", true).unwrap());
        assert!(flag_or(&v, "ODD", false).is_err());
    }

    #[test]
    fn test_region_default() {
        assert_eq!(region(&HashMap::new()), DEFAULT_REGION);
        assert_eq!(region(&vars(&[("AWS_REGION", "eu-west-1")])), "eu-west-1");
    }
}
