//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Use these for every value
//! that must never reach a log line: Redis AUTH tokens, connection URLs
//! that embed credentials, and similar material.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` around a secret stays safe to log via `{:?}` or `tracing`.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct CacheCredentials {
//!     endpoint: String,
//!     auth_token: SecretString,
//! }
//!
//! let creds = CacheCredentials {
//!     endpoint: "cache.example.com".to_string(),
//!     auth_token: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("hunter2"));
//! assert_eq!(creds.auth_token.expose_secret(), "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("auth-token-123");
        assert_eq!(secret.expose_secret(), "auth-token-123");
    }

    #[test]
    fn test_deserialize_keeps_value_out_of_debug() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct ClusterAuth {
            cluster_id: String,
            auth_token: SecretString,
        }

        let json = r#"{"cluster_id": "redis-a", "auth_token": "my-secret-value"}"#;
        let auth: ClusterAuth = serde_json::from_str(json).expect("deserialize");

        assert_eq!(auth.auth_token.expose_secret(), "my-secret-value");

        let debug = format!("{auth:?}");
        assert!(debug.contains("redis-a"));
        assert!(!debug.contains("my-secret-value"));
    }
}
