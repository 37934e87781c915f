//! [`NetworkAclApi`] on top of `aws-sdk-ec2`.

use crate::ec2::api::{DenyAllRule, Ec2Connector, NetworkAclApi, ALL_PROTOCOLS, ALL_TRAFFIC_CIDR};
use crate::errors::FaultError;
use crate::models::AclAssociation;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Filter, PortRange, RuleAction, Tag};
use aws_sdk_ec2::Client;
use tracing::warn;

fn ec2_error<E: std::error::Error>(operation: &str, err: &E) -> FaultError {
    warn!(
        target: "chaos.nacl.ec2",
        operation = operation,
        error = %DisplayErrorContext(err),
        "EC2 call failed"
    );
    FaultError::Ec2(format!("{operation} failed: {}", DisplayErrorContext(err)))
}

/// Region-scoped EC2 client.
#[derive(Debug, Clone)]
pub struct Ec2NetworkAcls {
    client: Client,
}

impl Ec2NetworkAcls {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        let conf = aws_sdk_ec2::config::Builder::from(sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Self {
            client: Client::from_conf(conf),
        }
    }
}

#[async_trait::async_trait]
impl NetworkAclApi for Ec2NetworkAcls {
    async fn create_network_acl(&self, vpc_id: &str) -> Result<String, FaultError> {
        let output = self
            .client
            .create_network_acl()
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| ec2_error("CreateNetworkAcl", &e))?;

        output
            .network_acl()
            .and_then(|acl| acl.network_acl_id())
            .map(str::to_string)
            .ok_or_else(|| FaultError::Ec2("CreateNetworkAcl returned no ACL id".to_string()))
    }

    async fn tag_resource(
        &self,
        resource_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), FaultError> {
        self.client
            .create_tags()
            .resources(resource_id)
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await
            .map_err(|e| ec2_error("CreateTags", &e))?;
        Ok(())
    }

    async fn create_deny_all_entry(
        &self,
        acl_id: &str,
        rule: DenyAllRule,
    ) -> Result<(), FaultError> {
        self.client
            .create_network_acl_entry()
            .network_acl_id(acl_id)
            .rule_number(rule.rule_number)
            .egress(rule.egress)
            .protocol(ALL_PROTOCOLS)
            .rule_action(RuleAction::Deny)
            .cidr_block(ALL_TRAFFIC_CIDR)
            .port_range(PortRange::builder().from(0).to(65535).build())
            .send()
            .await
            .map_err(|e| ec2_error("CreateNetworkAclEntry", &e))?;
        Ok(())
    }

    async fn subnets_in_zone(
        &self,
        vpc_id: &str,
        availability_zone: &str,
    ) -> Result<Vec<String>, FaultError> {
        let mut pages = self
            .client
            .describe_subnets()
            .filters(
                Filter::builder()
                    .name("availability-zone")
                    .values(availability_zone)
                    .build(),
            )
            .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
            .into_paginator()
            .send();

        let mut subnet_ids = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ec2_error("DescribeSubnets", &e))?;
            subnet_ids.extend(
                page.subnets()
                    .iter()
                    .filter_map(|s| s.subnet_id().map(str::to_string)),
            );
        }
        Ok(subnet_ids)
    }

    async fn associations_for_subnets(
        &self,
        subnet_ids: &[String],
    ) -> Result<Vec<AclAssociation>, FaultError> {
        let mut pages = self
            .client
            .describe_network_acls()
            .filters(
                Filter::builder()
                    .name("association.subnet-id")
                    .set_values(Some(subnet_ids.to_vec()))
                    .build(),
            )
            .into_paginator()
            .send();

        let mut associations = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ec2_error("DescribeNetworkAcls", &e))?;
            for acl in page.network_acls() {
                associations.extend(acl.associations().iter().filter_map(|a| {
                    Some(AclAssociation {
                        association_id: a.network_acl_association_id()?.to_string(),
                        network_acl_id: a.network_acl_id()?.to_string(),
                        subnet_id: a.subnet_id()?.to_string(),
                    })
                }));
            }
        }
        Ok(associations)
    }

    async fn replace_association(
        &self,
        association_id: &str,
        acl_id: &str,
    ) -> Result<String, FaultError> {
        let output = self
            .client
            .replace_network_acl_association()
            .association_id(association_id)
            .network_acl_id(acl_id)
            .send()
            .await
            .map_err(|e| ec2_error("ReplaceNetworkAclAssociation", &e))?;

        output
            .new_association_id()
            .map(str::to_string)
            .ok_or_else(|| {
                FaultError::Ec2(format!(
                    "ReplaceNetworkAclAssociation returned no association id for {association_id}"
                ))
            })
    }

    async fn delete_network_acl(&self, acl_id: &str) -> Result<(), FaultError> {
        self.client
            .delete_network_acl()
            .network_acl_id(acl_id)
            .send()
            .await
            .map_err(|e| ec2_error("DeleteNetworkAcl", &e))?;
        Ok(())
    }
}

/// Connector building SDK clients from one shared `SdkConfig`.
#[derive(Debug, Clone)]
pub struct SdkEc2Connector {
    sdk_config: SdkConfig,
}

impl SdkEc2Connector {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
        }
    }
}

impl Ec2Connector for SdkEc2Connector {
    type Api = Ec2NetworkAcls;

    fn for_region(&self, region: &str) -> Ec2NetworkAcls {
        Ec2NetworkAcls::new(&self.sdk_config, region)
    }
}
