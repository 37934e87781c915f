//! Tag-based discovery of target Redis clusters.
//!
//! Lists every cache cluster in a region, keeps available Redis clusters,
//! and matches their resource tags against a key/value pair. A tag lookup
//! failure for one cluster is logged and that cluster skipped.

use crate::errors::StressError;
use crate::models::ClusterDescriptor;
use aws_config::SdkConfig;
use aws_sdk_elasticache::config::Region;
use aws_sdk_elasticache::error::DisplayErrorContext;
use aws_sdk_elasticache::Client;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Engine name of Redis clusters.
pub const REDIS_ENGINE: &str = "redis";

/// Status of clusters that can be stressed.
pub const AVAILABLE_STATUS: &str = "available";

/// The subset of a cache cluster description discovery needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheClusterSummary {
    pub cluster_id: String,
    pub arn: Option<String>,
    pub engine: String,
    pub status: String,
    /// Configuration endpoint if present, else the first node's endpoint.
    pub endpoint: Option<(String, u16)>,
}

/// Control-plane view of cache clusters (enables mocking).
#[async_trait::async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Every cache cluster in `region`, across all pages.
    async fn list_clusters(&self, region: &str) -> Result<Vec<CacheClusterSummary>, StressError>;

    /// Resource tags of the cluster identified by `arn`.
    async fn cluster_tags(
        &self,
        region: &str,
        arn: &str,
    ) -> Result<HashMap<String, String>, StressError>;
}

/// [`ClusterDirectory`] backed by the ElastiCache API.
#[derive(Debug, Clone)]
pub struct ElastiCacheDirectory {
    sdk_config: SdkConfig,
}

impl ElastiCacheDirectory {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
        }
    }

    fn client(&self, region: &str) -> Client {
        let conf = aws_sdk_elasticache::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(conf)
    }
}

fn summarize(cluster: &aws_sdk_elasticache::types::CacheCluster) -> Option<CacheClusterSummary> {
    let cluster_id = cluster.cache_cluster_id()?.to_string();

    let endpoint = cluster
        .configuration_endpoint()
        .or_else(|| cluster.cache_nodes().first().and_then(|n| n.endpoint()))
        .and_then(|ep| {
            let address = ep.address()?.to_string();
            let port = u16::try_from(ep.port()?).ok()?;
            Some((address, port))
        });

    Some(CacheClusterSummary {
        cluster_id,
        arn: cluster.arn().map(str::to_string),
        engine: cluster.engine().unwrap_or_default().to_string(),
        status: cluster.cache_cluster_status().unwrap_or_default().to_string(),
        endpoint,
    })
}

#[async_trait::async_trait]
impl ClusterDirectory for ElastiCacheDirectory {
    async fn list_clusters(&self, region: &str) -> Result<Vec<CacheClusterSummary>, StressError> {
        let mut pages = self
            .client(region)
            .describe_cache_clusters()
            .show_cache_node_info(true)
            .into_paginator()
            .send();

        let mut clusters = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                StressError::Discovery(format!(
                    "DescribeCacheClusters failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
            clusters.extend(page.cache_clusters().iter().filter_map(summarize));
        }
        Ok(clusters)
    }

    async fn cluster_tags(
        &self,
        region: &str,
        arn: &str,
    ) -> Result<HashMap<String, String>, StressError> {
        let output = self
            .client(region)
            .list_tags_for_resource()
            .resource_name(arn)
            .send()
            .await
            .map_err(|e| {
                StressError::Discovery(format!(
                    "ListTagsForResource failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(output
            .tag_list()
            .iter()
            .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
            .collect())
    }
}

/// Finds clusters carrying a given tag.
pub struct ClusterLocator;

impl ClusterLocator {
    /// Available Redis clusters in `region` tagged `tag_key=tag_value`.
    ///
    /// # Errors
    ///
    /// Fails only if the cluster listing itself fails.
    #[instrument(skip_all, fields(region = %region, tag_key = %tag_key))]
    pub async fn find<D: ClusterDirectory + ?Sized>(
        directory: &D,
        region: &str,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<ClusterDescriptor>, StressError> {
        let clusters = directory.list_clusters(region).await?;
        let mut matches = Vec::new();

        for cluster in clusters {
            if cluster.engine != REDIS_ENGINE || cluster.status != AVAILABLE_STATUS {
                debug!(
                    target: "chaos.cache.locator",
                    cluster_id = %cluster.cluster_id,
                    engine = %cluster.engine,
                    status = %cluster.status,
                    "Skipping cluster"
                );
                continue;
            }

            let Some(arn) = cluster.arn.as_deref() else {
                warn!(
                    target: "chaos.cache.locator",
                    cluster_id = %cluster.cluster_id,
                    "Cluster has no ARN, skipping"
                );
                continue;
            };

            let tags = match directory.cluster_tags(region, arn).await {
                Ok(tags) => tags,
                Err(e) => {
                    warn!(
                        target: "chaos.cache.locator",
                        cluster_id = %cluster.cluster_id,
                        error = %e,
                        "Failed to read cluster tags, skipping"
                    );
                    continue;
                }
            };

            if tags.get(tag_key).map(String::as_str) != Some(tag_value) {
                continue;
            }

            let Some((endpoint, port)) = cluster.endpoint else {
                warn!(
                    target: "chaos.cache.locator",
                    cluster_id = %cluster.cluster_id,
                    "Tagged cluster has no endpoint, skipping"
                );
                continue;
            };

            matches.push(ClusterDescriptor {
                cluster_id: cluster.cluster_id,
                endpoint,
                port,
            });
        }

        info!(
            target: "chaos.cache.locator",
            region = %region,
            matched = matches.len(),
            "Cluster discovery complete"
        );
        Ok(matches)
    }
}

/// In-memory directory for unit tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock cluster directory.
    #[derive(Default)]
    pub struct MockClusterDirectory {
        clusters: Vec<CacheClusterSummary>,
        tags: HashMap<String, HashMap<String, String>>,
        failing_tag_arns: Vec<String>,
        fail_listing: bool,
        tag_calls: AtomicUsize,
    }

    impl MockClusterDirectory {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Add an available Redis cluster with the given tags.
        #[must_use]
        pub fn with_redis_cluster(self, cluster_id: &str, tags: &[(&str, &str)]) -> Self {
            self.with_cluster(
                CacheClusterSummary {
                    cluster_id: cluster_id.to_string(),
                    arn: Some(format!(
                        "arn:aws:elasticache:us-east-1:123456789012:cluster:{cluster_id}"
                    )),
                    engine: REDIS_ENGINE.to_string(),
                    status: AVAILABLE_STATUS.to_string(),
                    endpoint: Some((format!("{cluster_id}.cache.amazonaws.com"), 6379)),
                },
                tags,
            )
        }

        /// Add an arbitrary cluster with the given tags.
        #[must_use]
        pub fn with_cluster(mut self, cluster: CacheClusterSummary, tags: &[(&str, &str)]) -> Self {
            if let Some(arn) = &cluster.arn {
                self.tags.insert(
                    arn.clone(),
                    tags.iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                );
            }
            self.clusters.push(cluster);
            self
        }

        /// Make tag lookups for `cluster_id` fail.
        #[must_use]
        pub fn with_failing_tags(mut self, cluster_id: &str) -> Self {
            self.failing_tag_arns.push(format!(
                "arn:aws:elasticache:us-east-1:123456789012:cluster:{cluster_id}"
            ));
            self
        }

        /// Make the listing call fail.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail_listing: true,
                ..Self::default()
            }
        }

        pub fn tag_calls(&self) -> usize {
            self.tag_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ClusterDirectory for MockClusterDirectory {
        async fn list_clusters(
            &self,
            _region: &str,
        ) -> Result<Vec<CacheClusterSummary>, StressError> {
            if self.fail_listing {
                return Err(StressError::Discovery("Mock listing failure".to_string()));
            }
            Ok(self.clusters.clone())
        }

        async fn cluster_tags(
            &self,
            _region: &str,
            arn: &str,
        ) -> Result<HashMap<String, String>, StressError> {
            self.tag_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_tag_arns.iter().any(|a| a == arn) {
                return Err(StressError::Discovery("Mock tag failure".to_string()));
            }
            Ok(self.tags.get(arn).cloned().unwrap_or_default())
        }
    }
}
