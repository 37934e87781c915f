//! Common utilities shared across the chaos injector functions.

#![warn(clippy::pedantic)]

/// Module for AWS SDK configuration loading
pub mod aws;

/// Module for environment-driven configuration helpers
pub mod config;

/// Module for tracing subscriber setup, per-invocation spans and metric
/// test assertions
pub mod observability;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for shutdown signal handling
pub mod shutdown;
