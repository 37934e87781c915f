//! Points subnet associations at the chaos ACL.

use crate::ec2::NetworkAclApi;
use crate::errors::FaultError;
use crate::models::{AclAssociation, RollbackEntry};
use crate::observability::metrics;
use tracing::{error, info, instrument};

pub struct AssociationSwitcher;

impl AssociationSwitcher {
    /// Replace each association with one to `chaos_acl_id`, recording the
    /// new association id and the original ACL id.
    ///
    /// # Errors
    ///
    /// Stops at the first failed replacement. Entries switched before it are
    /// logged so they can be reverted by hand.
    #[instrument(skip_all, fields(chaos_acl_id = %chaos_acl_id, associations = associations.len()))]
    pub async fn switch<A: NetworkAclApi + ?Sized>(
        api: &A,
        associations: &[AclAssociation],
        chaos_acl_id: &str,
    ) -> Result<Vec<RollbackEntry>, FaultError> {
        let mut entries = Vec::with_capacity(associations.len());

        for association in associations {
            let new_association_id = match api
                .replace_association(&association.association_id, chaos_acl_id)
                .await
            {
                Ok(id) => {
                    metrics::record_association_switch("success");
                    id
                }
                Err(e) => {
                    metrics::record_association_switch("error");
                    error!(
                        target: "chaos.nacl.switcher",
                        subnet_id = %association.subnet_id,
                        already_switched = ?entries,
                        error = %e,
                        "Association switch failed part-way"
                    );
                    return Err(e);
                }
            };

            info!(
                target: "chaos.nacl.switcher",
                subnet_id = %association.subnet_id,
                original_acl_id = %association.network_acl_id,
                new_association_id = %new_association_id,
                "Subnet isolated"
            );

            entries.push(RollbackEntry {
                new_association_id,
                original_acl_id: association.network_acl_id.clone(),
                subnet_id: Some(association.subnet_id.clone()),
            });
        }

        Ok(entries)
    }
}
