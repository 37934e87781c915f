//! Cache stress configuration.
//!
//! Loaded from environment variables. The Redis AUTH token is redacted in
//! Debug output.

use common::config::{self as env_config, ConfigError};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

/// Default key prefix for synthetic stress keys.
pub const DEFAULT_STRESS_KEY_PREFIX: &str = "fis_stress";

/// Default Redis connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Cache stress function configuration.
#[derive(Clone)]
pub struct Config {
    /// Region used for cluster discovery when the request names none.
    pub region: String,

    /// Optional Redis AUTH token (ElastiCache auth).
    pub redis_auth_token: Option<SecretString>,

    /// Connect with TLS (`rediss://`), for in-transit encryption.
    pub redis_tls: bool,

    /// Timeout for opening each cluster connection.
    pub connect_timeout: Duration,

    /// Prefix of the stress key namespace (`<prefix>:<cluster_id>:<n>`).
    pub stress_key_prefix: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field(
                "redis_auth_token",
                &self.redis_auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redis_tls", &self.redis_tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("stress_key_prefix", &self.stress_key_prefix)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: env_config::DEFAULT_REGION.to_string(),
            redis_auth_token: None,
            redis_tls: false,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
            stress_key_prefix: DEFAULT_STRESS_KEY_PREFIX.to_string(),
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
        let redis_auth_token = vars
            .get("REDIS_AUTH_TOKEN")
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.clone()));

        let redis_tls = env_config::flag_or(vars, "REDIS_TLS", false)?;

        let connect_timeout_seconds = env_config::parse_or(
            vars,
            "REDIS_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_CONNECT_TIMEOUT_SECONDS,
        )?;
        if connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "REDIS_CONNECT_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let stress_key_prefix = vars
            .get("STRESS_KEY_PREFIX")
            .cloned()
            .unwrap_or_else(|| DEFAULT_STRESS_KEY_PREFIX.to_string());
        if stress_key_prefix.is_empty() || stress_key_prefix.contains('*') {
            return Err(ConfigError::InvalidValue(format!(
                "STRESS_KEY_PREFIX={stress_key_prefix}"
            )));
        }

        Ok(Config {
            region: env_config::region(vars),
            redis_auth_token,
            redis_tls,
            connect_timeout: Duration::from_secs(connect_timeout_seconds),
            stress_key_prefix,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load");

        assert_eq!(config.region, "us-east-1");
        assert!(config.redis_auth_token.is_none());
        assert!(!config.redis_tls);
        assert_eq!(
            config.connect_timeout,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS)
        );
        assert_eq!(config.stress_key_prefix, DEFAULT_STRESS_KEY_PREFIX);
    }

    #[test]
    fn test_from_vars_custom_values() {
        let vars = HashMap::from([
            ("AWS_REGION".to_string(), "ap-southeast-2".to_string()),
            ("REDIS_AUTH_TOKEN".to_string(), "s3cr3t-token".to_string()),
            ("REDIS_TLS".to_string(), "true".to_string()),
            ("REDIS_CONNECT_TIMEOUT_SECONDS".to_string(), "12".to_string()),
            ("STRESS_KEY_PREFIX".to_string(), "gameday".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load");

        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(
            config.redis_auth_token.as_ref().unwrap().expose_secret(),
            "s3cr3t-token"
        );
        assert!(config.redis_tls);
        assert_eq!(config.connect_timeout, Duration::from_secs(12));
        assert_eq!(config.stress_key_prefix, "gameday");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        for bad in ["0", "soon"] {
            let vars = HashMap::from([(
                "REDIS_CONNECT_TIMEOUT_SECONDS".to_string(),
                bad.to_string(),
            )]);
            assert!(matches!(
                Config::from_vars(&vars),
                Err(ConfigError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn test_glob_prefix_rejected() {
        let vars = HashMap::from([("STRESS_KEY_PREFIX".to_string(), "fis*".to_string())]);
        assert!(Config::from_vars(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_auth_token() {
        let vars = HashMap::from([("REDIS_AUTH_TOKEN".to_string(), "s3cr3t-token".to_string())]);
        let config = Config::from_vars(&vars).unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("s3cr3t-token"));
    }
}
