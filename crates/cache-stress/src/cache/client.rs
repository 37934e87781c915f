//! Cache client traits (enable mocking).

use crate::errors::StressError;
use crate::models::ClusterDescriptor;

/// Memory telemetry from `INFO memory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    /// `used_memory` in bytes.
    pub used_memory: u64,
    /// `maxmemory` in bytes; 0 means unbounded.
    pub max_memory: u64,
}

/// Commands issued against one connected target.
#[async_trait::async_trait]
pub trait CacheClient: Send {
    /// `CONFIG SET <parameter> <value>`.
    async fn config_set(&mut self, parameter: &str, value: &str) -> Result<(), StressError>;

    /// `CONFIG GET <parameter>`; `None` if the server does not know it.
    async fn config_get(&mut self, parameter: &str) -> Result<Option<String>, StressError>;

    /// `INFO memory`, read live on every call.
    async fn memory_info(&mut self) -> Result<MemoryInfo, StressError>;

    /// `evicted_keys` from `INFO stats` (cumulative since server start).
    async fn evicted_keys(&mut self) -> Result<u64, StressError>;

    /// `SET <key> <value>`.
    async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StressError>;

    /// `DEL <keys...>`, returning how many existed. Callers must not pass an
    /// empty slice.
    async fn delete(&mut self, keys: &[String]) -> Result<u64, StressError>;

    /// `KEYS <pattern>`.
    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>, StressError>;
}

/// Opens connections to targets.
#[async_trait::async_trait]
pub trait CacheConnector: Send + Sync {
    type Client: CacheClient;

    /// Connect to `cluster`.
    ///
    /// # Errors
    ///
    /// Returns `StressError::Connection` if the target is unreachable.
    async fn connect(&self, cluster: &ClusterDescriptor) -> Result<Self::Client, StressError>;
}
