//! Stress stages, each operating on one connected target.

pub mod cleaner;
pub mod filler;
pub mod hold;
pub mod locator;
pub mod observer;
pub mod policy;

pub use cleaner::Cleaner;
pub use filler::{FillAborted, FillExit, FillLimits, FillReport, MemoryFiller};
pub use hold::{hold_stress, HoldOutcome};
pub use locator::{ClusterDirectory, ClusterLocator, ElastiCacheDirectory};
pub use observer::EvictionObserver;
pub use policy::PolicyConfigurer;
