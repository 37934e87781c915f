//! redis-rs backed cache client.
//!
//! # Connection Pattern
//!
//! One `MultiplexedConnection` is opened per target per invocation and
//! dropped when the stage finishes; nothing is pooled across invocations.
//! The AUTH token is injected into the parsed `ConnectionInfo` rather than
//! the URL so it never appears in a formatted string.

use crate::cache::client::{CacheClient, CacheConnector, MemoryInfo};
use crate::config::Config;
use crate::errors::StressError;
use crate::models::ClusterDescriptor;
use common::secret::{ExposeSecret, SecretString};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, InfoDict, IntoConnectionInfo};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connects to Redis targets over TCP or TLS.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    auth_token: Option<SecretString>,
    tls: bool,
    connect_timeout: Duration,
}

impl RedisConnector {
    #[must_use]
    pub fn new(auth_token: Option<SecretString>, tls: bool, connect_timeout: Duration) -> Self {
        Self {
            auth_token,
            tls,
            connect_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.redis_auth_token.clone(),
            config.redis_tls,
            config.connect_timeout,
        )
    }

    /// Connection URL without credentials.
    fn url_for(&self, cluster: &ClusterDescriptor) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        format!("{scheme}://{}:{}", cluster.endpoint, cluster.port)
    }
}

#[async_trait::async_trait]
impl CacheConnector for RedisConnector {
    type Client = RedisCacheClient;

    #[instrument(skip_all, fields(cluster_id = %cluster.cluster_id))]
    async fn connect(&self, cluster: &ClusterDescriptor) -> Result<RedisCacheClient, StressError> {
        let mut info = self
            .url_for(cluster)
            .as_str()
            .into_connection_info()
            .map_err(|e| StressError::Connection(format!("Invalid endpoint: {e}")))?;

        if let Some(token) = &self.auth_token {
            info.redis.password = Some(token.expose_secret().to_string());
        }

        let client = Client::open(info)
            .map_err(|e| StressError::Connection(format!("Failed to open Redis client: {e}")))?;

        let connection = tokio::time::timeout(
            self.connect_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            warn!(
                target: "chaos.cache.redis",
                timeout_secs = self.connect_timeout.as_secs(),
                "Timed out connecting to Redis"
            );
            StressError::Connection(format!(
                "Timed out after {}s connecting to {}:{}",
                self.connect_timeout.as_secs(),
                cluster.endpoint,
                cluster.port
            ))
        })?
        .map_err(|e| {
            warn!(target: "chaos.cache.redis", error = %e, "Failed to connect to Redis");
            StressError::Connection(format!("Failed to connect to Redis: {e}"))
        })?;

        debug!(target: "chaos.cache.redis", "Connected");
        Ok(RedisCacheClient { connection })
    }
}

/// A single live connection to one target.
pub struct RedisCacheClient {
    connection: MultiplexedConnection,
}

impl RedisCacheClient {
    async fn info_section(&mut self, section: &str) -> Result<InfoDict, StressError> {
        redis::cmd("INFO")
            .arg(section)
            .query_async(&mut self.connection)
            .await
            .map_err(|e| redis_error(&format!("INFO {section}"), &e))
    }
}

fn redis_error(operation: &str, e: &redis::RedisError) -> StressError {
    warn!(target: "chaos.cache.redis", error = %e, operation = %operation, "Redis command failed");
    StressError::Redis(format!("{operation} failed: {e}"))
}

#[async_trait::async_trait]
impl CacheClient for RedisCacheClient {
    async fn config_set(&mut self, parameter: &str, value: &str) -> Result<(), StressError> {
        let _: () = redis::cmd("CONFIG")
            .arg("SET")
            .arg(parameter)
            .arg(value)
            .query_async(&mut self.connection)
            .await
            .map_err(|e| redis_error(&format!("CONFIG SET {parameter}"), &e))?;
        Ok(())
    }

    async fn config_get(&mut self, parameter: &str) -> Result<Option<String>, StressError> {
        let reply: HashMap<String, String> = redis::cmd("CONFIG")
            .arg("GET")
            .arg(parameter)
            .query_async(&mut self.connection)
            .await
            .map_err(|e| redis_error(&format!("CONFIG GET {parameter}"), &e))?;
        Ok(reply.get(parameter).cloned())
    }

    async fn memory_info(&mut self) -> Result<MemoryInfo, StressError> {
        let info = self.info_section("memory").await?;
        let used_memory: u64 = info.get("used_memory").ok_or_else(|| {
            StressError::Redis("INFO memory did not report used_memory".to_string())
        })?;
        Ok(MemoryInfo {
            used_memory,
            max_memory: info.get("maxmemory").unwrap_or(0),
        })
    }

    async fn evicted_keys(&mut self) -> Result<u64, StressError> {
        let info = self.info_section("stats").await?;
        Ok(info.get("evicted_keys").unwrap_or(0))
    }

    async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StressError> {
        let _: () = self
            .connection
            .set(key, value)
            .await
            .map_err(|e| redis_error("SET", &e))?;
        Ok(())
    }

    async fn delete(&mut self, keys: &[String]) -> Result<u64, StressError> {
        self.connection
            .del(keys)
            .await
            .map_err(|e| redis_error("DEL", &e))
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>, StressError> {
        self.connection
            .keys(pattern)
            .await
            .map_err(|e| redis_error("KEYS", &e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cluster() -> ClusterDescriptor {
        ClusterDescriptor {
            cluster_id: "redis-a".to_string(),
            endpoint: "127.0.0.1".to_string(),
            port: 6390,
        }
    }

    #[test]
    fn test_url_scheme_follows_tls_flag() {
        let plain = RedisConnector::new(None, false, Duration::from_secs(1));
        assert_eq!(plain.url_for(&cluster()), "redis://127.0.0.1:6390");

        let tls = RedisConnector::new(None, true, Duration::from_secs(1));
        assert_eq!(tls.url_for(&cluster()), "rediss://127.0.0.1:6390");
    }

    #[test]
    fn test_url_never_contains_token() {
        let connector = RedisConnector::new(
            Some(SecretString::from("hunter2")),
            true,
            Duration::from_secs(1),
        );
        assert!(!connector.url_for(&cluster()).contains("hunter2"));
        assert!(!format!("{connector:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_connection_error() {
        // Nothing listens on port 1; the connect fails or times out quickly.
        let connector = RedisConnector::new(None, false, Duration::from_millis(500));
        let target = ClusterDescriptor {
            port: 1,
            ..cluster()
        };

        let result = connector.connect(&target).await;
        assert!(matches!(result, Err(StressError::Connection(_))));
    }
}
