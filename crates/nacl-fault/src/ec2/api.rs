//! Network ACL API traits (enable mocking).

use crate::errors::FaultError;
use crate::models::AclAssociation;

/// CIDR covered by the deny-all entries.
pub const ALL_TRAFFIC_CIDR: &str = "0.0.0.0/0";

/// Protocol number meaning every protocol.
pub const ALL_PROTOCOLS: &str = "-1";

/// A deny-all entry: all protocols, all ports, `0.0.0.0/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenyAllRule {
    pub rule_number: i32,
    pub egress: bool,
}

impl DenyAllRule {
    /// Outbound deny-all, rule 100.
    pub const EGRESS: DenyAllRule = DenyAllRule {
        rule_number: 100,
        egress: true,
    };

    /// Inbound deny-all, rule 101.
    pub const INGRESS: DenyAllRule = DenyAllRule {
        rule_number: 101,
        egress: false,
    };
}

/// Region-scoped EC2 network ACL calls.
#[async_trait::async_trait]
pub trait NetworkAclApi: Send + Sync {
    /// `CreateNetworkAcl` in `vpc_id`; returns the new ACL id.
    async fn create_network_acl(&self, vpc_id: &str) -> Result<String, FaultError>;

    /// `CreateTags` with a single tag on `resource_id`.
    async fn tag_resource(&self, resource_id: &str, key: &str, value: &str)
        -> Result<(), FaultError>;

    /// `CreateNetworkAclEntry` for a deny-all rule.
    async fn create_deny_all_entry(&self, acl_id: &str, rule: DenyAllRule)
        -> Result<(), FaultError>;

    /// Ids of the subnets in `availability_zone` of `vpc_id`.
    async fn subnets_in_zone(
        &self,
        vpc_id: &str,
        availability_zone: &str,
    ) -> Result<Vec<String>, FaultError>;

    /// ACL associations of the given subnets. Callers must not pass an
    /// empty slice.
    async fn associations_for_subnets(
        &self,
        subnet_ids: &[String],
    ) -> Result<Vec<AclAssociation>, FaultError>;

    /// `ReplaceNetworkAclAssociation`; returns the new association id.
    async fn replace_association(
        &self,
        association_id: &str,
        acl_id: &str,
    ) -> Result<String, FaultError>;

    /// `DeleteNetworkAcl`.
    async fn delete_network_acl(&self, acl_id: &str) -> Result<(), FaultError>;
}

/// Builds a [`NetworkAclApi`] for a region.
pub trait Ec2Connector: Send + Sync {
    type Api: NetworkAclApi;

    fn for_region(&self, region: &str) -> Self::Api;
}
