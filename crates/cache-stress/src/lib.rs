//! Cache Stress Library
//!
//! Memory-pressure fault injection for ElastiCache Redis clusters. One
//! function serves four actions, selected by the event's `action` field:
//!
//! - `apply_stress` - set `allkeys-lru`, fill each cluster to a percentage
//!   of `maxmemory` with synthetic keys, then hold
//! - `test_evictions` - push a overflow batch and report eviction counters
//! - `cleanup` - delete the recorded stress keys and all overflow keys
//! - `find_clusters` - list available Redis clusters carrying a tag
//!
//! # Architecture
//!
//! ```text
//! main.rs -> handlers.rs -> services/*.rs -> cache/*.rs
//! ```
//!
//! Clusters are processed sequentially with one connection each. Per-cluster
//! failures are aggregated into the response instead of failing the
//! invocation.
//!
//! # Modules
//!
//! - `cache` - Redis connection and command traits
//! - `config` - Function configuration from environment
//! - `errors` - Error types
//! - `handlers` - Action dispatch and per-cluster aggregation
//! - `models` - Wire payloads
//! - `observability` - Metrics for fills, evictions and failures
//! - `services` - Policy setup, fill loop, eviction check, cleanup, discovery, hold

pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod services;
