//! AWS SDK configuration loading.

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load the shared SDK configuration, optionally pinned to `region`.
///
/// Credentials come from the default provider chain (the Lambda execution
/// role in production).
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
