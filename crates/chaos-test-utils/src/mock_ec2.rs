//! In-memory EC2 network ACL state.
//!
//! Models the pieces the fault touches: subnets (with VPC and zone), network
//! ACLs (tags and deny-all entries) and the one association each subnet has.
//! Replacing an association issues a fresh association id, as EC2 does.

use nacl_fault::ec2::{DenyAllRule, Ec2Connector, NetworkAclApi};
use nacl_fault::errors::FaultError;
use nacl_fault::models::AclAssociation;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ec2Operation {
    CreateNetworkAcl,
    CreateTags,
    CreateNetworkAclEntry,
    DescribeSubnets,
    DescribeNetworkAcls,
    ReplaceNetworkAclAssociation,
    DeleteNetworkAcl,
}

#[derive(Debug, Clone)]
struct Subnet {
    subnet_id: String,
    vpc_id: String,
    availability_zone: String,
}

#[derive(Debug, Clone, Default)]
struct Acl {
    tags: HashMap<String, String>,
    entries: Vec<DenyAllRule>,
}

#[derive(Debug, Clone)]
struct Association {
    association_id: String,
    acl_id: String,
}

#[derive(Debug, Default)]
struct Ec2State {
    subnets: Vec<Subnet>,
    acls: HashMap<String, Acl>,
    /// subnet id -> association
    associations: HashMap<String, Association>,
    next_id: u64,
    calls: HashMap<Ec2Operation, usize>,
    failures: HashMap<Ec2Operation, usize>,
    regions: Vec<String>,
}

impl Ec2State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:08x}", self.next_id)
    }

    /// Count the call and fail it if it is the configured nth.
    fn record(&mut self, op: Ec2Operation) -> Result<(), FaultError> {
        let count = {
            let count = self.calls.entry(op).or_insert(0);
            *count += 1;
            *count
        };
        if self.failures.get(&op) == Some(&count) {
            return Err(FaultError::Ec2(format!(
                "{op:?} failed: RequestLimitExceeded (mock)"
            )));
        }
        Ok(())
    }
}

/// Mock EC2 account.
#[derive(Debug, Clone, Default)]
pub struct MockEc2 {
    inner: Arc<Mutex<Ec2State>>,
}

impl MockEc2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subnet associated with `acl_id` (created if missing).
    #[must_use]
    pub fn with_subnet(
        self,
        subnet_id: &str,
        vpc_id: &str,
        availability_zone: &str,
        acl_id: &str,
    ) -> Self {
        {
            let mut state = self.inner.lock().unwrap();
            state.acls.entry(acl_id.to_string()).or_default();
            state.subnets.push(Subnet {
                subnet_id: subnet_id.to_string(),
                vpc_id: vpc_id.to_string(),
                availability_zone: availability_zone.to_string(),
            });
            state.associations.insert(
                subnet_id.to_string(),
                Association {
                    association_id: format!("aclassoc-{subnet_id}"),
                    acl_id: acl_id.to_string(),
                },
            );
        }
        self
    }

    /// Fail the `nth` (1-based) call of `op`.
    #[must_use]
    pub fn failing_on(self, op: Ec2Operation, nth: usize) -> Self {
        self.inner.lock().unwrap().failures.insert(op, nth);
        self
    }

    /// subnet id -> associated ACL id.
    pub fn topology(&self) -> BTreeMap<String, String> {
        self.inner
            .lock()
            .unwrap()
            .associations
            .iter()
            .map(|(subnet, a)| (subnet.clone(), a.acl_id.clone()))
            .collect()
    }

    pub fn association_id(&self, subnet_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .associations
            .get(subnet_id)
            .map(|a| a.association_id.clone())
    }

    pub fn acl_exists(&self, acl_id: &str) -> bool {
        self.inner.lock().unwrap().acls.contains_key(acl_id)
    }

    pub fn acl_count(&self) -> usize {
        self.inner.lock().unwrap().acls.len()
    }

    pub fn acl_tag(&self, acl_id: &str, key: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .acls
            .get(acl_id)
            .and_then(|acl| acl.tags.get(key).cloned())
    }

    pub fn acl_entries(&self, acl_id: &str) -> Vec<DenyAllRule> {
        self.inner
            .lock()
            .unwrap()
            .acls
            .get(acl_id)
            .map(|acl| acl.entries.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self, op: Ec2Operation) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Regions requested through [`Ec2Connector::for_region`].
    pub fn regions(&self) -> Vec<String> {
        self.inner.lock().unwrap().regions.clone()
    }
}

#[async_trait::async_trait]
impl NetworkAclApi for MockEc2 {
    async fn create_network_acl(&self, _vpc_id: &str) -> Result<String, FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::CreateNetworkAcl)?;
        let acl_id = state.next_id("acl");
        state.acls.insert(acl_id.clone(), Acl::default());
        Ok(acl_id)
    }

    async fn tag_resource(
        &self,
        resource_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::CreateTags)?;
        let acl = state
            .acls
            .get_mut(resource_id)
            .ok_or_else(|| FaultError::Ec2(format!("InvalidID: {resource_id}")))?;
        acl.tags.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn create_deny_all_entry(
        &self,
        acl_id: &str,
        rule: DenyAllRule,
    ) -> Result<(), FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::CreateNetworkAclEntry)?;
        let acl = state
            .acls
            .get_mut(acl_id)
            .ok_or_else(|| FaultError::Ec2(format!("InvalidNetworkAclID.NotFound: {acl_id}")))?;
        if acl
            .entries
            .iter()
            .any(|e| e.rule_number == rule.rule_number && e.egress == rule.egress)
        {
            return Err(FaultError::Ec2(format!(
                "NetworkAclEntryAlreadyExists: rule {}",
                rule.rule_number
            )));
        }
        acl.entries.push(rule);
        Ok(())
    }

    async fn subnets_in_zone(
        &self,
        vpc_id: &str,
        availability_zone: &str,
    ) -> Result<Vec<String>, FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::DescribeSubnets)?;
        Ok(state
            .subnets
            .iter()
            .filter(|s| s.vpc_id == vpc_id && s.availability_zone == availability_zone)
            .map(|s| s.subnet_id.clone())
            .collect())
    }

    async fn associations_for_subnets(
        &self,
        subnet_ids: &[String],
    ) -> Result<Vec<AclAssociation>, FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::DescribeNetworkAcls)?;
        if subnet_ids.is_empty() {
            return Err(FaultError::Ec2(
                "InvalidParameterValue: filter values must not be empty".to_string(),
            ));
        }

        // DescribeNetworkAcls returns whole ACLs, so every association of a
        // matching ACL comes back, including subnets outside the filter.
        let matching_acls: Vec<String> = subnet_ids
            .iter()
            .filter_map(|s| state.associations.get(s).map(|a| a.acl_id.clone()))
            .collect();
        let mut associations: Vec<AclAssociation> = state
            .associations
            .iter()
            .filter(|(_, a)| matching_acls.contains(&a.acl_id))
            .map(|(subnet_id, a)| AclAssociation {
                association_id: a.association_id.clone(),
                network_acl_id: a.acl_id.clone(),
                subnet_id: subnet_id.clone(),
            })
            .collect();
        associations.sort_by(|a, b| a.subnet_id.cmp(&b.subnet_id));
        Ok(associations)
    }

    async fn replace_association(
        &self,
        association_id: &str,
        acl_id: &str,
    ) -> Result<String, FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::ReplaceNetworkAclAssociation)?;
        if !state.acls.contains_key(acl_id) {
            return Err(FaultError::Ec2(format!("InvalidNetworkAclID.NotFound: {acl_id}")));
        }
        let new_id = state.next_id("aclassoc");
        let association = state
            .associations
            .values_mut()
            .find(|a| a.association_id == association_id)
            .ok_or_else(|| {
                FaultError::Ec2(format!("InvalidAssociationID.NotFound: {association_id}"))
            })?;
        association.association_id = new_id.clone();
        association.acl_id = acl_id.to_string();
        Ok(new_id)
    }

    async fn delete_network_acl(&self, acl_id: &str) -> Result<(), FaultError> {
        let mut state = self.inner.lock().unwrap();
        state.record(Ec2Operation::DeleteNetworkAcl)?;
        if state.associations.values().any(|a| a.acl_id == acl_id) {
            return Err(FaultError::Ec2(format!(
                "DependencyViolation: {acl_id} has associations"
            )));
        }
        state
            .acls
            .remove(acl_id)
            .map(|_| ())
            .ok_or_else(|| FaultError::Ec2(format!("InvalidNetworkAclID.NotFound: {acl_id}")))
    }
}

impl Ec2Connector for MockEc2 {
    type Api = MockEc2;

    fn for_region(&self, region: &str) -> MockEc2 {
        self.inner.lock().unwrap().regions.push(region.to_string());
        self.clone()
    }
}
