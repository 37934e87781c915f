//! Network ACL fault configuration.

use common::config::{self as env_config, ConfigError};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Default `Name` tag of the chaos ACL.
pub const DEFAULT_CHAOS_NACL_NAME: &str = "chaos-nacl";

/// Default wait between creating the chaos ACL and tagging it.
pub const DEFAULT_SETTLE_SECONDS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Region the shared SDK configuration is loaded for. EC2 calls are
    /// always sent to the `Region` of the event (inject) or record
    /// (rollback), never to this one.
    pub region: String,

    /// `Name` tag written on the chaos ACL, for manual rollback.
    pub chaos_nacl_name: String,

    /// Wait after `CreateNetworkAcl` before tagging the new ACL.
    pub settle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: env_config::DEFAULT_REGION.to_string(),
            chaos_nacl_name: DEFAULT_CHAOS_NACL_NAME.to_string(),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_SECONDS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let chaos_nacl_name = vars
            .get("CHAOS_NACL_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CHAOS_NACL_NAME.to_string());
        if chaos_nacl_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "CHAOS_NACL_NAME must not be empty".to_string(),
            ));
        }

        let settle_seconds =
            env_config::parse_or(vars, "CHAOS_NACL_SETTLE_SECONDS", DEFAULT_SETTLE_SECONDS)?;

        Ok(Config {
            region: env_config::region(vars),
            chaos_nacl_name,
            settle_delay: Duration::from_secs(settle_seconds),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load");
        assert_eq!(config.chaos_nacl_name, "chaos-nacl");
        assert_eq!(config.settle_delay, Duration::from_secs(5));
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_zero_settle_is_allowed() {
        let vars = HashMap::from([
            ("CHAOS_NACL_SETTLE_SECONDS".to_string(), "0".to_string()),
            ("CHAOS_NACL_NAME".to_string(), "gameday-blackhole".to_string()),
        ]);
        let config = Config::from_vars(&vars).unwrap();
        assert!(config.settle_delay.is_zero());
        assert_eq!(config.chaos_nacl_name, "gameday-blackhole");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let vars = HashMap::from([("CHAOS_NACL_SETTLE_SECONDS".to_string(), "-1".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));

        let vars = HashMap::from([("CHAOS_NACL_NAME".to_string(), "  ".to_string())]);
        assert!(Config::from_vars(&vars).is_err());
    }
}
