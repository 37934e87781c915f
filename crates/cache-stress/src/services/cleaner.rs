//! Removes the keys a stress run left behind.

use crate::cache::CacheClient;
use crate::errors::StressError;
use crate::models::StressRecord;
use tracing::{debug, info, instrument};

pub struct Cleaner;

impl Cleaner {
    /// Delete the record's written keys and every overflow key of its
    /// cluster. Returns the number of keys that existed and were removed.
    ///
    /// No `DEL` is issued for an empty key list; some servers reject a
    /// zero-argument `DEL`.
    #[instrument(skip_all, fields(cluster_id = %record.cluster.cluster_id))]
    pub async fn clean<C: CacheClient + ?Sized>(
        client: &mut C,
        record: &StressRecord,
    ) -> Result<u64, StressError> {
        let cluster_id = &record.cluster.cluster_id;
        let mut deleted = 0;

        if record.keys.is_empty() {
            debug!(
                target: "chaos.cache.cleaner",
                cluster_id = %cluster_id,
                "No stress keys recorded"
            );
        } else {
            deleted += client.delete(&record.keys).await?;
        }

        let overflow_keys = client
            .keys(&record.cluster.eviction_test_pattern())
            .await?;
        if !overflow_keys.is_empty() {
            deleted += client.delete(&overflow_keys).await?;
        }

        info!(
            target: "chaos.cache.cleaner",
            cluster_id = %cluster_id,
            recorded_keys = record.keys.len(),
            overflow_keys = overflow_keys.len(),
            deleted = deleted,
            "Cleanup complete"
        );

        Ok(deleted)
    }
}
