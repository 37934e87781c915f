//! Finds the ACL associations of every subnet in one availability zone.

use crate::ec2::NetworkAclApi;
use crate::errors::FaultError;
use crate::models::AclAssociation;
use tracing::{info, instrument};

pub struct SubnetSelector;

impl SubnetSelector {
    /// Current associations of the subnets in (`availability_zone`,
    /// `vpc_id`). A zone without subnets yields an empty list.
    #[instrument(skip_all, fields(vpc_id = %vpc_id, availability_zone = %availability_zone))]
    pub async fn select<A: NetworkAclApi + ?Sized>(
        api: &A,
        vpc_id: &str,
        availability_zone: &str,
    ) -> Result<Vec<AclAssociation>, FaultError> {
        let subnet_ids = api.subnets_in_zone(vpc_id, availability_zone).await?;
        if subnet_ids.is_empty() {
            info!(target: "chaos.nacl.selector", "No subnets in availability zone");
            return Ok(Vec::new());
        }

        let associations: Vec<AclAssociation> = api
            .associations_for_subnets(&subnet_ids)
            .await?
            .into_iter()
            .filter(|a| subnet_ids.contains(&a.subnet_id))
            .collect();

        info!(
            target: "chaos.nacl.selector",
            subnets = subnet_ids.len(),
            associations = associations.len(),
            "Selected subnet associations"
        );
        Ok(associations)
    }
}
