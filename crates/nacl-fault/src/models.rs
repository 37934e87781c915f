//! Injection and rollback payloads.
//!
//! Field names mirror the automation document contract: the inject event is
//! PascalCase (`VPCId`), the rollback record mixes `snake_case` and
//! `PascalCase` keys.

use crate::errors::FaultError;
use serde::{Deserialize, Serialize};

/// Inject event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InjectRequest {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "AvailabilityZone")]
    pub availability_zone: String,
    #[serde(rename = "VPCId")]
    pub vpc_id: String,
}

/// A subnet's association with a network ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclAssociation {
    pub association_id: String,
    pub network_acl_id: String,
    pub subnet_id: String,
}

/// One switched association: the id it has now, and the ACL it must be
/// pointed back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEntry {
    #[serde(rename = "NewAssociationId")]
    pub new_association_id: String,
    #[serde(rename = "Nacl_Id")]
    pub original_acl_id: String,
    #[serde(rename = "SubnetId", default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// Everything rollback needs. Exactly one entry per switched association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub region: String,
    pub rollback_conf: Vec<RollbackEntry>,
    pub chaos_nacl_id: String,
}

impl RollbackRecord {
    /// Encode as the JSON string handed back to the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::Serialization` if encoding fails.
    pub fn to_json_string(&self) -> Result<String, FaultError> {
        serde_json::to_string(self).map_err(|e| FaultError::Serialization(e.to_string()))
    }
}

/// `saved_configuration` as delivered: usually the JSON string produced by
/// injection, sometimes already decoded by the orchestrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SavedConfiguration {
    Record(RollbackRecord),
    Encoded(String),
}

impl SavedConfiguration {
    /// Resolve to a record, decoding the string form if needed.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::InvalidRequest` if the string is not a record.
    pub fn into_record(self) -> Result<RollbackRecord, FaultError> {
        match self {
            SavedConfiguration::Record(record) => Ok(record),
            SavedConfiguration::Encoded(raw) => serde_json::from_str(&raw).map_err(|e| {
                FaultError::InvalidRequest(format!(
                    "saved_configuration is not a rollback record: {e}"
                ))
            }),
        }
    }
}

/// Rollback event.
#[derive(Debug, Clone, Deserialize)]
pub struct RollbackRequest {
    pub saved_configuration: SavedConfiguration,
}
