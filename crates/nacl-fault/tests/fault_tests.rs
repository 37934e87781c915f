//! Integration tests for network isolation inject and rollback.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use anyhow::Result;
use chaos_test_utils::{Ec2Operation, MockEc2};
use common::observability::testing::capture_metrics_async;
use nacl_fault::config::Config;
use nacl_fault::ec2::DenyAllRule;
use nacl_fault::errors::FaultError;
use nacl_fault::handlers::FaultHandler;
use nacl_fault::models::{InjectRequest, RollbackRecord};
use serde_json::{json, Value};
use std::time::Duration;

fn config() -> Config {
    Config {
        settle_delay: Duration::ZERO,
        ..Config::default()
    }
}

/// Two subnets in the target zone share one ACL, a third has its own, and
/// a fourth sits in another zone on the shared ACL.
fn ec2() -> MockEc2 {
    MockEc2::new()
        .with_subnet("subnet-a1", "vpc-1", "us-east-1a", "acl-shared")
        .with_subnet("subnet-a2", "vpc-1", "us-east-1a", "acl-shared")
        .with_subnet("subnet-a3", "vpc-1", "us-east-1a", "acl-private")
        .with_subnet("subnet-b1", "vpc-1", "us-east-1b", "acl-shared")
        .with_subnet("subnet-x1", "vpc-2", "us-east-1a", "acl-other")
}

fn inject_request() -> InjectRequest {
    InjectRequest {
        region: "us-east-1".to_string(),
        availability_zone: "us-east-1a".to_string(),
        vpc_id: "vpc-1".to_string(),
    }
}

#[tokio::test]
async fn test_inject_isolates_only_the_target_zone() {
    let ec2 = ec2();
    let handler = FaultHandler::new(ec2.clone(), &config());

    let record = handler.inject(&inject_request()).await.unwrap();
    let chaos = record.chaos_nacl_id.clone();

    let topology = ec2.topology();
    assert_eq!(topology["subnet-a1"], chaos);
    assert_eq!(topology["subnet-a2"], chaos);
    assert_eq!(topology["subnet-a3"], chaos);
    assert_eq!(topology["subnet-b1"], "acl-shared");
    assert_eq!(topology["subnet-x1"], "acl-other");

    assert_eq!(ec2.acl_tag(&chaos, "Name"), Some("chaos-nacl".to_string()));
    assert_eq!(
        ec2.acl_entries(&chaos),
        vec![DenyAllRule::EGRESS, DenyAllRule::INGRESS]
    );

    assert_eq!(record.region, "us-east-1");
    assert_eq!(record.rollback_conf.len(), 3);
    for entry in &record.rollback_conf {
        let subnet = entry.subnet_id.as_deref().unwrap();
        assert_eq!(ec2.association_id(subnet).as_deref(), Some(entry.new_association_id.as_str()));
    }
    let originals: Vec<&str> = record
        .rollback_conf
        .iter()
        .map(|e| e.original_acl_id.as_str())
        .collect();
    assert_eq!(originals, vec!["acl-shared", "acl-shared", "acl-private"]);
    assert_eq!(ec2.regions(), vec!["us-east-1".to_string()]);
}

#[tokio::test]
async fn test_rollback_restores_topology_and_deletes_chaos_acl() {
    let ec2 = ec2();
    let before = ec2.topology();
    let acls_before = ec2.acl_count();
    let handler = FaultHandler::new(ec2.clone(), &config());

    let record = handler.inject(&inject_request()).await.unwrap();
    assert_ne!(ec2.topology(), before);

    handler.rollback(&record).await.unwrap();

    assert_eq!(ec2.topology(), before);
    assert!(!ec2.acl_exists(&record.chaos_nacl_id));
    assert_eq!(ec2.acl_count(), acls_before);
}

#[tokio::test]
async fn test_string_round_trip_through_handlers() -> Result<()> {
    let ec2 = ec2();
    let before = ec2.topology();
    let handler = FaultHandler::new(ec2.clone(), &config());

    let saved = handler
        .handle_inject(json!({
            "Region": "us-east-1",
            "AvailabilityZone": "us-east-1a",
            "VPCId": "vpc-1"
        }))
        .await?;

    // Injection hands back a JSON string, not an object.
    let Value::String(encoded) = &saved else {
        panic!("expected a string, got {saved}");
    };
    let record: RollbackRecord = serde_json::from_str(encoded)?;
    assert_eq!(record.rollback_conf.len(), 3);

    let response = handler
        .handle_rollback(json!({ "saved_configuration": saved }))
        .await?;

    assert_eq!(response, Value::Null);
    assert_eq!(ec2.topology(), before);
    Ok(())
}

#[tokio::test]
async fn test_rollback_accepts_decoded_record() {
    let ec2 = ec2();
    let before = ec2.topology();
    let handler = FaultHandler::new(ec2.clone(), &config());
    let record = handler.inject(&inject_request()).await.unwrap();

    handler
        .handle_rollback(json!({ "saved_configuration": serde_json::to_value(&record).unwrap() }))
        .await
        .unwrap();

    assert_eq!(ec2.topology(), before);
}

#[tokio::test]
async fn test_zone_without_subnets_gives_empty_record() {
    let ec2 = ec2();
    let handler = FaultHandler::new(ec2.clone(), &config());

    let record = handler
        .inject(&InjectRequest {
            availability_zone: "us-east-1f".to_string(),
            ..inject_request()
        })
        .await
        .unwrap();

    assert!(record.rollback_conf.is_empty());
    assert_eq!(ec2.calls(Ec2Operation::DescribeNetworkAcls), 0);

    handler.rollback(&record).await.unwrap();
    assert!(!ec2.acl_exists(&record.chaos_nacl_id));
}

#[tokio::test]
async fn test_switch_failure_fails_fast() {
    let ec2 = ec2().failing_on(Ec2Operation::ReplaceNetworkAclAssociation, 2);
    let handler = FaultHandler::new(ec2.clone(), &config());

    let result = handler.inject(&inject_request()).await;

    assert!(matches!(result, Err(FaultError::Ec2(_))));
    // Stopped at the failing call, the third association was never tried.
    assert_eq!(ec2.calls(Ec2Operation::ReplaceNetworkAclAssociation), 2);
}

#[tokio::test]
async fn test_provisioning_failure_stops_before_switching() {
    let ec2 = ec2().failing_on(Ec2Operation::CreateNetworkAclEntry, 2);
    let before = ec2.topology();
    let handler = FaultHandler::new(ec2.clone(), &config());

    assert!(handler.inject(&inject_request()).await.is_err());
    assert_eq!(ec2.calls(Ec2Operation::DescribeSubnets), 0);
    assert_eq!(ec2.topology(), before);
}

#[tokio::test]
async fn test_rollback_failure_keeps_chaos_acl() {
    let ec2 = ec2();
    let handler = FaultHandler::new(ec2.clone(), &config());
    let record = handler.inject(&inject_request()).await.unwrap();

    let failing = ec2.clone().failing_on(Ec2Operation::ReplaceNetworkAclAssociation, 4);
    let handler = FaultHandler::new(failing, &config());

    assert!(handler.rollback(&record).await.is_err());
    assert_eq!(ec2.calls(Ec2Operation::DeleteNetworkAcl), 0);
    assert!(ec2.acl_exists(&record.chaos_nacl_id));
}

#[tokio::test]
async fn test_invalid_events_rejected() {
    let handler = FaultHandler::new(ec2(), &config());

    let inject = handler.handle_inject(json!({"Region": "us-east-1"})).await;
    assert!(matches!(inject, Err(FaultError::InvalidRequest(_))));

    let rollback = handler
        .handle_rollback(json!({"saved_configuration": "{\"region\": 1}"}))
        .await;
    assert!(matches!(rollback, Err(FaultError::InvalidRequest(_))));
}

#[tokio::test(start_paused = true)]
async fn test_settle_delay_precedes_tagging() {
    let ec2 = ec2();
    let handler = FaultHandler::new(ec2.clone(), &Config::default());
    let start = tokio::time::Instant::now();

    let record = handler.inject(&inject_request()).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(
        ec2.acl_tag(&record.chaos_nacl_id, "Name"),
        Some("chaos-nacl".to_string())
    );
}

#[tokio::test]
async fn test_event_region_wins_over_configured_region() {
    let ec2 = ec2();
    let config = Config {
        region: "eu-west-1".to_string(),
        ..config()
    };
    let handler = FaultHandler::new(ec2.clone(), &config);

    let record = handler.inject(&inject_request()).await.unwrap();
    handler.rollback(&record).await.unwrap();

    assert_eq!(record.region, "us-east-1");
    assert_eq!(
        ec2.regions(),
        vec!["us-east-1".to_string(), "us-east-1".to_string()]
    );
}

#[test]
fn test_inject_and_rollback_record_metrics() {
    let ec2 = ec2();
    let handler = FaultHandler::new(ec2.clone(), &config());

    let (record, snapshot) = capture_metrics_async(handler.inject(&inject_request()));
    let record = record.unwrap();

    assert_eq!(
        snapshot.counter("nacl_fault_injections_total", &[("status", "success")]),
        1
    );
    assert_eq!(
        snapshot.counter("nacl_fault_association_switches_total", &[("status", "success")]),
        3
    );

    let (result, snapshot) = capture_metrics_async(handler.rollback(&record));
    result.unwrap();

    assert_eq!(
        snapshot.counter("nacl_fault_rollbacks_total", &[("status", "success")]),
        1
    );
    assert_eq!(
        snapshot.counter("nacl_fault_association_restores_total", &[("status", "success")]),
        3
    );
}

#[test]
fn test_failed_switch_recorded_as_error() {
    let ec2 = ec2().failing_on(Ec2Operation::ReplaceNetworkAclAssociation, 2);
    let handler = FaultHandler::new(ec2, &config());

    let (result, snapshot) = capture_metrics_async(handler.inject(&inject_request()));

    assert!(result.is_err());
    assert_eq!(
        snapshot.counter("nacl_fault_association_switches_total", &[("status", "success")]),
        1
    );
    assert_eq!(
        snapshot.counter("nacl_fault_association_switches_total", &[("status", "error")]),
        1
    );
    assert_eq!(
        snapshot.counter("nacl_fault_injections_total", &[("status", "error")]),
        1
    );
    assert_eq!(
        snapshot.histogram("nacl_fault_injection_duration_seconds", &[("status", "error")]).len(),
        1
    );
}
