//! Network ACL Fault Library
//!
//! Simulates the loss of an availability zone by swapping every subnet in
//! that zone onto a deny-all network ACL, and restores the original
//! associations afterwards.
//!
//! Injection runs `ChaosAclProvisioner` -> `SubnetSelector` ->
//! `AssociationSwitcher` and returns a rollback record; rollback replays that
//! record through `RollbackExecutor`. The record is the only state carried
//! between the two invocations.
//!
//! # Modules
//!
//! - `config` - Function configuration from environment
//! - `ec2` - EC2 network ACL traits and the SDK implementation
//! - `errors` - Error types
//! - `handlers` - Inject and rollback entry points
//! - `models` - Wire payloads
//! - `observability` - Inject, rollback and association metrics
//! - `services` - Fault stages

pub mod config;
pub mod ec2;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod services;
