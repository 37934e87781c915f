//! Restores the original associations and deletes the chaos ACL.
//!
//! Precondition: nothing else touched the recorded associations since
//! injection. The record is replayed as-is, without rediscovery.

use crate::ec2::NetworkAclApi;
use crate::errors::FaultError;
use crate::models::RollbackRecord;
use crate::observability::metrics;
use tracing::{info, instrument};

pub struct RollbackExecutor;

impl RollbackExecutor {
    /// Re-point every recorded association to its original ACL, then delete
    /// the chaos ACL.
    ///
    /// # Errors
    ///
    /// Stops at the first EC2 failure; the chaos ACL is not deleted while
    /// any association may still reference it.
    #[instrument(skip_all, fields(
        chaos_acl_id = %record.chaos_nacl_id,
        entries = record.rollback_conf.len()
    ))]
    pub async fn execute<A: NetworkAclApi + ?Sized>(
        api: &A,
        record: &RollbackRecord,
    ) -> Result<(), FaultError> {
        for entry in &record.rollback_conf {
            let restored = api
                .replace_association(&entry.new_association_id, &entry.original_acl_id)
                .await;
            metrics::record_association_restore(metrics::status_of(&restored));
            let restored = restored?;
            info!(
                target: "chaos.nacl.rollback",
                subnet_id = entry.subnet_id.as_deref().unwrap_or("unknown"),
                acl_id = %entry.original_acl_id,
                association_id = %restored,
                "Association restored"
            );
        }

        api.delete_network_acl(&record.chaos_nacl_id).await?;
        info!(
            target: "chaos.nacl.rollback",
            acl_id = %record.chaos_nacl_id,
            "Deleted chaos network ACL"
        );
        Ok(())
    }
}
