//! Experiment Trigger Library
//!
//! Two thin entry points that start fault-injection experiments:
//!
//! - schedule - a timer event starts the template from
//!   `EXPERIMENT_TEMPLATE_ID`
//! - pipeline - a pipeline stage starts the template named in its user
//!   parameters and reports the job result
//!
//! # Modules
//!
//! - `config` - Function configuration from environment
//! - `errors` - Error types
//! - `fis` - Experiment start trait and FIS implementation
//! - `handlers` - Schedule and pipeline handlers
//! - `models` - Trigger events
//! - `observability` - Start and job report metrics
//! - `pipeline` - Job reporting trait and CodePipeline implementation

pub mod config;
pub mod errors;
pub mod fis;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod pipeline;
