//! Inject and rollback handlers.
//!
//! Unlike the cache path these are fail-fast: the first EC2 error aborts the
//! invocation and surfaces to the orchestrator.

use crate::config::Config;
use crate::ec2::Ec2Connector;
use crate::errors::FaultError;
use crate::models::{InjectRequest, RollbackRecord, RollbackRequest};
use crate::observability::metrics;
use crate::services::{AssociationSwitcher, ChaosAclProvisioner, RollbackExecutor, SubnetSelector};
use serde_json::Value;
use std::time::Instant;
use tracing::{info, instrument};

pub struct FaultHandler<E> {
    connector: E,
    provisioner: ChaosAclProvisioner,
}

impl<E: Ec2Connector> FaultHandler<E> {
    #[must_use]
    pub fn new(connector: E, config: &Config) -> Self {
        Self {
            connector,
            provisioner: ChaosAclProvisioner::new(
                config.chaos_nacl_name.clone(),
                config.settle_delay,
            ),
        }
    }

    /// Isolate every subnet of one availability zone.
    ///
    /// # Errors
    ///
    /// Any EC2 failure.
    #[instrument(skip_all, fields(
        region = %request.region,
        availability_zone = %request.availability_zone,
        vpc_id = %request.vpc_id
    ))]
    pub async fn inject(&self, request: &InjectRequest) -> Result<RollbackRecord, FaultError> {
        let start = Instant::now();
        let result = self.isolate(request).await;
        metrics::record_injection(metrics::status_of(&result), start.elapsed());
        result
    }

    async fn isolate(&self, request: &InjectRequest) -> Result<RollbackRecord, FaultError> {
        info!(
            target: "chaos.nacl.handler",
            region = %request.region,
            "Injecting network isolation"
        );
        let api = self.connector.for_region(&request.region);

        let chaos_nacl_id = self.provisioner.provision(&api, &request.vpc_id).await?;
        let associations =
            SubnetSelector::select(&api, &request.vpc_id, &request.availability_zone).await?;
        let rollback_conf = AssociationSwitcher::switch(&api, &associations, &chaos_nacl_id).await?;

        info!(
            target: "chaos.nacl.handler",
            chaos_nacl_id = %chaos_nacl_id,
            switched = rollback_conf.len(),
            "Network isolation in place"
        );

        Ok(RollbackRecord {
            region: request.region.clone(),
            rollback_conf,
            chaos_nacl_id,
        })
    }

    /// Undo an injection from its record.
    ///
    /// # Errors
    ///
    /// Any EC2 failure.
    #[instrument(skip_all, fields(region = %record.region))]
    pub async fn rollback(&self, record: &RollbackRecord) -> Result<(), FaultError> {
        info!(
            target: "chaos.nacl.handler",
            region = %record.region,
            "Rolling back network isolation"
        );
        let start = Instant::now();
        let api = self.connector.for_region(&record.region);
        let result = RollbackExecutor::execute(&api, record).await;
        metrics::record_rollback(metrics::status_of(&result), start.elapsed());
        result
    }

    /// Inject entry point: raw event in, rollback record as a JSON string out.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a malformed event, otherwise as [`Self::inject`].
    pub async fn handle_inject(&self, event: Value) -> Result<Value, FaultError> {
        let request: InjectRequest = serde_json::from_value(event)
            .map_err(|e| FaultError::InvalidRequest(e.to_string()))?;
        let record = self.inject(&request).await?;
        Ok(Value::String(record.to_json_string()?))
    }

    /// Rollback entry point: raw event in, `null` out.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a malformed event, otherwise as [`Self::rollback`].
    pub async fn handle_rollback(&self, event: Value) -> Result<Value, FaultError> {
        let request: RollbackRequest = serde_json::from_value(event)
            .map_err(|e| FaultError::InvalidRequest(e.to_string()))?;
        let record = request.saved_configuration.into_record()?;
        self.rollback(&record).await?;
        Ok(Value::Null)
    }
}
