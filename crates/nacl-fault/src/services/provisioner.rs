//! Creates the deny-all chaos ACL.

use crate::ec2::{DenyAllRule, NetworkAclApi};
use crate::errors::FaultError;
use std::time::Duration;
use tracing::{info, instrument};

/// Tag key written on the chaos ACL.
pub const NAME_TAG_KEY: &str = "Name";

#[derive(Debug, Clone)]
pub struct ChaosAclProvisioner {
    name: String,
    settle_delay: Duration,
}

impl ChaosAclProvisioner {
    #[must_use]
    pub fn new(name: impl Into<String>, settle_delay: Duration) -> Self {
        Self {
            name: name.into(),
            settle_delay,
        }
    }

    /// Create an ACL in `vpc_id`, tag it, and add deny-all egress and
    /// ingress entries. Returns the ACL id.
    ///
    /// # Errors
    ///
    /// Any EC2 failure. An ACL created before the failure is left in place
    /// and identifiable by its `Name` tag.
    #[instrument(skip_all, fields(vpc_id = %vpc_id))]
    pub async fn provision<A: NetworkAclApi + ?Sized>(
        &self,
        api: &A,
        vpc_id: &str,
    ) -> Result<String, FaultError> {
        let acl_id = api.create_network_acl(vpc_id).await?;
        info!(
            target: "chaos.nacl.provisioner",
            vpc_id = %vpc_id,
            acl_id = %acl_id,
            "Created chaos network ACL"
        );

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        api.tag_resource(&acl_id, NAME_TAG_KEY, &self.name).await?;

        for rule in [DenyAllRule::EGRESS, DenyAllRule::INGRESS] {
            api.create_deny_all_entry(&acl_id, rule).await?;
        }

        info!(
            target: "chaos.nacl.provisioner",
            acl_id = %acl_id,
            name = %self.name,
            "Chaos network ACL denies all traffic"
        );
        Ok(acl_id)
    }
}
