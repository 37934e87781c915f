//! EC2 collaborators.
//!
//! - [`Ec2Connector`] hands out a region-scoped API per invocation
//! - [`NetworkAclApi`] is the set of network ACL and subnet calls the fault
//!   needs
//!
//! [`Ec2NetworkAcls`] is the production implementation on the AWS SDK.

pub mod api;
pub mod sdk;

pub use api::{DenyAllRule, Ec2Connector, NetworkAclApi};
pub use sdk::{Ec2NetworkAcls, SdkEc2Connector};
