//! Test utilities for the chaos injectors.
//!
//! - [`MockCache`] - in-memory Redis fleet with memory accounting, LRU
//!   eviction and failure injection
//! - [`MockEc2`] - in-memory subnets, network ACLs and associations with
//!   failure injection
//!
//! # Example
//!
//! ```rust,ignore
//! use chaos_test_utils::{MockCache, MockEc2, Ec2Operation};
//!
//! let cache = MockCache::new()
//!     .with_cluster("redis-a", MockClusterSpec::unbounded(10 * MIB))
//!     .with_unreachable("redis-b");
//!
//! let ec2 = MockEc2::new()
//!     .with_subnet("subnet-a", "vpc-1", "us-east-1a", "acl-default")
//!     .failing_on(Ec2Operation::DeleteNetworkAcl, 1);
//! ```

pub mod mock_cache;
pub mod mock_ec2;

pub use mock_cache::{MockCache, MockCacheClient, MockClusterSpec, MIB};
pub use mock_ec2::{Ec2Operation, MockEc2};
