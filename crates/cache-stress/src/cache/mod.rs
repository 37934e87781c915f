//! Cache collaborators.
//!
//! The stress stages talk to a target through two traits:
//! - [`CacheConnector`] opens one connection per target per invocation
//! - [`CacheClient`] issues the handful of commands the stages need
//!   (`SET`, `DEL`, `KEYS`, `CONFIG GET/SET`, `INFO memory|stats`)
//!
//! [`RedisConnector`] is the production implementation on top of redis-rs.

pub mod client;
pub mod redis_client;

pub use client::{CacheClient, CacheConnector, MemoryInfo};
pub use redis_client::{RedisCacheClient, RedisConnector};
