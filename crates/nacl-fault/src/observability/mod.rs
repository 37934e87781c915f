//! Observability for the network ACL fault functions.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `nacl_fault_injections_total` | Counter | `status` | Inject invocations |
//! | `nacl_fault_injection_duration_seconds` | Histogram | `status` | Inject latency, settle wait included |
//! | `nacl_fault_rollbacks_total` | Counter | `status` | Rollback invocations |
//! | `nacl_fault_rollback_duration_seconds` | Histogram | `status` | Rollback latency |
//! | `nacl_fault_association_switches_total` | Counter | `status` | Subnets moved onto the chaos ACL |
//! | `nacl_fault_association_restores_total` | Counter | `status` | Subnets moved back to their original ACL |

pub mod metrics;
