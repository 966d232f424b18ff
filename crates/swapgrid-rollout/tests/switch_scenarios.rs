//! End-to-end deploy and rollback scenarios against the in-memory cluster.

use std::time::Duration;

use swap_core::*;
use swapgrid_gateway::{GatewayError, InMemoryGateway, Operation, ResourceKind};
use swapgrid_health::PollPolicy;
use swapgrid_rollout::*;

fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn orders_service(version: &str) -> Service {
    Service {
        name: "orders".to_string(),
        namespace: "default".to_string(),
        labels: labels(&[("team", "checkout")]),
        selector: LabelSelector::from(labels(&[("app", "orders"), ("version", version)])),
        resource_version: None,
        manifest: None,
    }
}

fn orders_group(variant: Variant, image: &str, replicas: u32) -> ReplicaGroup {
    let l = labels(&[("app", "orders"), ("version", variant.as_str())]);
    ReplicaGroup {
        name: format!("orders{}", variant.suffix()),
        namespace: "default".to_string(),
        labels: l.clone(),
        replicas,
        selector: LabelSelector::from(l.clone()),
        template: InstanceTemplate {
            labels: l,
            containers: vec![
                Container {
                    name: "api".to_string(),
                    image: image.to_string(),
                },
                Container {
                    name: "metrics".to_string(),
                    image: "exporter:0.9".to_string(),
                },
            ],
        },
        status: ReplicaStatus {
            replicas,
            available_replicas: replicas,
        },
        resource_version: None,
        manifest: None,
    }
}

/// `orders` routed to `orders--blue` (2/2 ready, api at orders:1.0).
fn blue_cluster(gw: InMemoryGateway) -> InMemoryGateway {
    gw.insert_service(orders_service("blue"));
    gw.insert_replica_group(orders_group(Variant::Blue, "orders:1.0", 2));
    gw
}

fn switcher(gw: &InMemoryGateway) -> Switcher<InMemoryGateway> {
    Switcher::new(gw.clone(), PollPolicy::new(Duration::from_millis(1), 20))
}

fn deploy_request(image: &str) -> DeployRequest {
    DeployRequest {
        service: "orders".to_string(),
        image: image.to_string(),
        container: "api".to_string(),
    }
}

fn live_groups(gw: &InMemoryGateway) -> Vec<String> {
    gw.replica_group_names()
        .into_iter()
        .filter(|name| gw.replica_group(name).is_some_and(|g| g.replicas > 0))
        .collect()
}

// ── Deploy ────────────────────────────────────────────────────────

#[tokio::test]
async fn deploy_blue_to_green() {
    let gw = blue_cluster(InMemoryGateway::new("default").with_rollout_reads(3));

    let report = switcher(&gw).deploy(&deploy_request("orders:2.0")).await.unwrap();

    assert_eq!(
        report,
        DeployReport {
            service: "orders".to_string(),
            previous_replica_group: "orders--blue".to_string(),
            previous_variant: Variant::Blue,
            replica_group: "orders--green".to_string(),
            variant: Variant::Green,
            image: "orders:2.0".to_string(),
            replicas: 2,
        }
    );

    let green = gw.replica_group("orders--green").unwrap();
    assert_eq!(green.replicas, 2);
    assert_eq!(green.status.available_replicas, 2);
    assert_eq!(green.container("api").unwrap().image, "orders:2.0");
    assert_eq!(green.container("metrics").unwrap().image, "exporter:0.9");
    assert_eq!(green.template.labels.get(VERSION_LABEL).unwrap(), "green");

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.selector.encode(), "app=orders,version=green");
    assert_eq!(svc.previous_replica_group(), Some("orders--blue"));
    assert_eq!(svc.labels.get("team").unwrap(), "checkout");

    let blue = gw.replica_group("orders--blue").unwrap();
    assert_eq!(blue.replicas, 0);
    assert_eq!(blue.container("api").unwrap().image, "orders:1.0");

    assert_eq!(live_groups(&gw), vec!["orders--green".to_string()]);
}

#[tokio::test]
async fn deploy_green_to_blue() {
    let gw = InMemoryGateway::new("default");
    gw.insert_service(orders_service("green"));
    gw.insert_replica_group(orders_group(Variant::Green, "orders:2.0", 3));
    gw.insert_replica_group(orders_group(Variant::Blue, "orders:1.0", 0));

    let report = switcher(&gw).deploy(&deploy_request("orders:3.0")).await.unwrap();
    assert_eq!(report.replica_group, "orders--blue");
    assert_eq!(report.variant, Variant::Blue);

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Blue));
    assert_eq!(svc.previous_replica_group(), Some("orders--green"));

    let blue = gw.replica_group("orders--blue").unwrap();
    assert_eq!(blue.replicas, 3);
    assert_eq!(blue.container("api").unwrap().image, "orders:3.0");
    assert_eq!(live_groups(&gw), vec!["orders--blue".to_string()]);
}

#[tokio::test]
async fn deploy_replaces_stale_shadow() {
    let gw = blue_cluster(InMemoryGateway::new("default").with_termination_reads(2));
    let mut stale = orders_group(Variant::Green, "orders:0.1", 5);
    stale.labels.insert("leftover".to_string(), "true".to_string());
    gw.insert_replica_group(stale);

    switcher(&gw).deploy(&deploy_request("orders:2.0")).await.unwrap();

    let green = gw.replica_group("orders--green").unwrap();
    assert_eq!(green.replicas, 2);
    assert_eq!(green.container("api").unwrap().image, "orders:2.0");
    assert!(!green.labels.contains_key("leftover"));

    let mutations = gw.mutations();
    let delete = mutations
        .iter()
        .position(|m| *m == (Operation::DeleteReplicaGroup, "orders--green".to_string()))
        .unwrap();
    let create = mutations
        .iter()
        .position(|m| *m == (Operation::CreateReplicaGroup, "orders--green".to_string()))
        .unwrap();
    assert!(delete < create);
}

#[tokio::test]
async fn stale_shadow_that_never_leaves_aborts_before_create() {
    let gw = blue_cluster(InMemoryGateway::new("default").with_termination_reads(1_000));
    gw.insert_replica_group(orders_group(Variant::Green, "orders:0.1", 1));

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwitchError::ProvisioningTimeout { ref name, attempts: 20 } if name == "orders--green"
    ));

    assert_eq!(gw.count(Operation::CreateReplicaGroup), 0);
    assert_eq!(gw.count(Operation::UpdateService), 0);
    assert_eq!(gw.replica_group("orders--blue").unwrap().replicas, 2);
}

#[tokio::test]
async fn shadow_that_never_gets_ready_is_left_for_inspection() {
    let gw = blue_cluster(InMemoryGateway::new("default").with_rollout_reads(1));
    gw.stall("orders--green");

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwitchError::DeploymentNotReady { ref name, .. } if name == "orders--green"
    ));

    assert!(gw.replica_group("orders--green").is_some());
    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Blue));
    assert_eq!(svc.previous_replica_group(), None);
    assert_eq!(gw.replica_group("orders--blue").unwrap().replicas, 2);
}

#[tokio::test]
async fn unknown_container_fails_without_mutation() {
    let gw = blue_cluster(InMemoryGateway::new("default"));

    let req = DeployRequest {
        container: "worker".to_string(),
        ..deploy_request("orders:2.0")
    };
    let err = switcher(&gw).deploy(&req).await.unwrap_err();
    assert!(matches!(err, SwitchError::ContainerNotFound { .. }));
    assert!(gw.mutations().is_empty());
}

#[tokio::test]
async fn deploy_without_backing_group_is_not_found() {
    let gw = InMemoryGateway::new("default");
    gw.insert_service(orders_service("blue"));
    gw.insert_replica_group(orders_group(Variant::Green, "orders:1.0", 2));

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(gw.mutations().is_empty());
}

#[tokio::test]
async fn delete_failure_other_than_absent_is_fatal() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    gw.fail_next(
        Operation::DeleteReplicaGroup,
        GatewayError::Api {
            code: 403,
            message: "forbidden".to_string(),
        },
    );

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwitchError::Gateway(GatewayError::Api { code: 403, .. })
    ));
    assert_eq!(gw.count(Operation::CreateReplicaGroup), 0);
}

#[tokio::test]
async fn create_failure_is_surfaced_verbatim() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    let quota = GatewayError::Api {
        code: 422,
        message: "exceeded quota".to_string(),
    };
    gw.fail_next(Operation::CreateReplicaGroup, quota.clone());

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), quota.to_string());
    assert_eq!(gw.count(Operation::UpdateService), 0);
}

#[tokio::test]
async fn service_update_conflict_leaves_traffic_on_old_variant() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    gw.fail_next(
        Operation::UpdateService,
        GatewayError::Conflict {
            kind: ResourceKind::Service,
            name: "orders".to_string(),
        },
    );

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::Gateway(GatewayError::Conflict { .. })));
    assert!(!err.traffic_switched());

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Blue));
    assert_eq!(gw.replica_group("orders--blue").unwrap().replicas, 2);
    assert_eq!(gw.count(Operation::UpdateScale), 0);
}

#[tokio::test]
async fn scale_down_failure_is_reported_after_cutover() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    gw.fail_next(
        Operation::UpdateScale,
        GatewayError::Transport("connection reset".to_string()),
    );

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(err.traffic_switched());
    assert!(matches!(
        err,
        SwitchError::Decommission { ref switched_to, ref replica_group, .. }
            if switched_to == "orders--green" && replica_group == "orders--blue"
    ));

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Green));
    assert_eq!(svc.previous_replica_group(), Some("orders--blue"));
}

#[tokio::test]
async fn unrecognised_version_tag_routes_to_blue() {
    let gw = InMemoryGateway::new("default");
    let mut svc = orders_service("blue");
    svc.selector = LabelSelector::from(labels(&[("app", "orders")]));
    gw.insert_service(svc);
    let mut green = orders_group(Variant::Green, "orders:1.0", 2);
    green.labels.insert(VERSION_LABEL.to_string(), "stable".to_string());
    gw.insert_replica_group(green);

    let report = switcher(&gw).deploy(&deploy_request("orders:2.0")).await.unwrap();
    assert_eq!(report.replica_group, "orders--blue");
    assert_eq!(report.variant, Variant::Blue);
    assert_eq!(gw.service("orders").unwrap().selector.get(VERSION_LABEL), Some("blue"));
}

#[tokio::test]
async fn name_and_version_label_disagreeing_fails_without_mutation() {
    let gw = InMemoryGateway::new("default");
    gw.insert_service(orders_service("green"));
    let mut blue = orders_group(Variant::Blue, "orders:1.0", 2);
    let green_labels = labels(&[("app", "orders"), ("version", "green")]);
    blue.labels = green_labels.clone();
    blue.template.labels = green_labels.clone();
    blue.selector = LabelSelector::from(green_labels);
    gw.insert_replica_group(blue);

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwitchError::VariantMismatch { ref replica_group, variant: Variant::Blue, ref version_tag }
            if replica_group == "orders--blue" && version_tag == "green"
    ));
    assert!(!err.traffic_switched());
    assert!(gw.mutations().is_empty());
    assert_eq!(gw.service("orders").unwrap().routed_variant(), Some(Variant::Green));
    assert_eq!(live_groups(&gw), vec!["orders--blue".to_string()]);
}

#[tokio::test]
async fn unrecognised_tag_on_blue_group_fails_without_mutation() {
    let gw = InMemoryGateway::new("default");
    let mut svc = orders_service("blue");
    svc.selector = LabelSelector::from(labels(&[("app", "orders")]));
    gw.insert_service(svc);
    let mut blue = orders_group(Variant::Blue, "orders:1.0", 2);
    blue.labels.insert(VERSION_LABEL.to_string(), "stable".to_string());
    gw.insert_replica_group(blue);

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::VariantMismatch { .. }));
    assert!(gw.mutations().is_empty());
}

#[tokio::test]
async fn group_without_variant_suffix_or_label_is_rejected() {
    let gw = InMemoryGateway::new("default");
    let mut svc = orders_service("blue");
    svc.selector = LabelSelector::from(labels(&[("app", "orders")]));
    gw.insert_service(svc);
    let mut plain = orders_group(Variant::Blue, "orders:1.0", 2);
    plain.name = "orders".to_string();
    plain.labels.remove(VERSION_LABEL);
    gw.insert_replica_group(plain);

    let err = switcher(&gw)
        .deploy(&deploy_request("orders:2.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::UnrecognizedVariant(ref name) if name == "orders"));
    assert!(gw.mutations().is_empty());
}

// ── Rollback ──────────────────────────────────────────────────────

#[tokio::test]
async fn rollback_without_marker_fails_without_mutation() {
    let gw = blue_cluster(InMemoryGateway::new("default"));

    let err = switcher(&gw).rollback("orders").await.unwrap_err();
    assert!(matches!(
        err,
        SwitchError::NoPreviousReplicaGroup { ref service } if service == "orders"
    ));
    assert!(err.to_string().contains("cannot find old replica group"));
    assert!(gw.mutations().is_empty());
}

#[tokio::test]
async fn deploy_then_rollback_round_trips() {
    let gw = blue_cluster(InMemoryGateway::new("default").with_rollout_reads(2));
    let original = gw.service("orders").unwrap();
    let sw = switcher(&gw);

    sw.deploy(&deploy_request("orders:2.0")).await.unwrap();
    let report = sw.rollback("orders").await.unwrap();

    assert_eq!(
        report,
        RollbackReport {
            service: "orders".to_string(),
            restored_replica_group: "orders--blue".to_string(),
            restored_replicas: 2,
            retired_replica_group: "orders--green".to_string(),
            selector: original.selector.clone(),
        }
    );

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.selector, original.selector);
    assert_eq!(svc.labels, original.labels);
    assert_eq!(svc.previous_replica_group(), None);

    let blue = gw.replica_group("orders--blue").unwrap();
    assert_eq!(blue.replicas, 2);
    assert_eq!(blue.container("api").unwrap().image, "orders:1.0");
    assert_eq!(gw.replica_group("orders--green").unwrap().replicas, 0);
    assert_eq!(live_groups(&gw), vec!["orders--blue".to_string()]);
}

#[tokio::test]
async fn rollback_restores_then_cuts_over_then_retires() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    let sw = switcher(&gw);
    sw.deploy(&deploy_request("orders:2.0")).await.unwrap();
    let before = gw.mutations().len();

    sw.rollback("orders").await.unwrap();

    let rollback_mutations: Vec<_> = gw.mutations().into_iter().skip(before).collect();
    assert_eq!(
        rollback_mutations,
        vec![
            (Operation::UpdateScale, "orders--blue".to_string()),
            (Operation::UpdateService, "orders".to_string()),
            (Operation::UpdateScale, "orders--green".to_string()),
        ]
    );
}

#[tokio::test]
async fn rollback_is_valid_once_per_swap() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    let sw = switcher(&gw);
    sw.deploy(&deploy_request("orders:2.0")).await.unwrap();
    sw.rollback("orders").await.unwrap();

    let before = gw.mutations().len();
    let err = sw.rollback("orders").await.unwrap_err();
    assert!(matches!(err, SwitchError::NoPreviousReplicaGroup { .. }));
    assert_eq!(gw.mutations().len(), before);
}

#[tokio::test]
async fn rollback_restores_full_selector_from_template() {
    let gw = InMemoryGateway::new("default");
    let mut svc = orders_service("green");
    svc.labels
        .insert(PREVIOUS_REPLICA_GROUP_LABEL.to_string(), "orders--blue".to_string());
    gw.insert_service(svc);
    gw.insert_replica_group(orders_group(Variant::Green, "orders:2.0", 4));
    let mut blue = orders_group(Variant::Blue, "orders:1.0", 0);
    blue.template.labels.insert("tier".to_string(), "web".to_string());
    gw.insert_replica_group(blue);

    let report = switcher(&gw).rollback("orders").await.unwrap();
    assert_eq!(report.restored_replicas, 4);
    assert_eq!(
        gw.service("orders").unwrap().selector.encode(),
        "app=orders,tier=web,version=blue"
    );
    assert_eq!(gw.replica_group("orders--blue").unwrap().replicas, 4);
}

#[tokio::test]
async fn rollback_target_that_never_gets_ready_keeps_traffic() {
    let gw = InMemoryGateway::new("default").with_rollout_reads(1);
    let mut svc = orders_service("green");
    svc.labels
        .insert(PREVIOUS_REPLICA_GROUP_LABEL.to_string(), "orders--blue".to_string());
    gw.insert_service(svc);
    gw.insert_replica_group(orders_group(Variant::Green, "orders:2.0", 2));
    gw.insert_replica_group(orders_group(Variant::Blue, "orders:1.0", 0));
    gw.stall("orders--blue");

    let err = switcher(&gw).rollback("orders").await.unwrap_err();
    assert!(matches!(err, SwitchError::DeploymentNotReady { .. }));

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Green));
    assert_eq!(svc.previous_replica_group(), Some("orders--blue"));
    assert_eq!(gw.replica_group("orders--green").unwrap().replicas, 2);
}

#[tokio::test]
async fn rollback_to_missing_group_is_not_found() {
    let gw = InMemoryGateway::new("default");
    let mut svc = orders_service("green");
    svc.labels
        .insert(PREVIOUS_REPLICA_GROUP_LABEL.to_string(), "orders--blue".to_string());
    gw.insert_service(svc);
    gw.insert_replica_group(orders_group(Variant::Green, "orders:2.0", 2));

    let err = switcher(&gw).rollback("orders").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(gw.mutations().is_empty());
}

#[tokio::test]
async fn reports_serialize_to_json() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    let report = switcher(&gw).deploy(&deploy_request("orders:2.0")).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["variant"], "green");
    assert_eq!(json["previous_replica_group"], "orders--blue");
}

#[tokio::test]
async fn rollback_scale_down_failure_is_reported_after_revert() {
    let gw = blue_cluster(InMemoryGateway::new("default"));
    let sw = switcher(&gw);
    sw.deploy(&deploy_request("orders:2.0")).await.unwrap();

    // The restoring scale-up goes through; retiring green fails.
    gw.fail_later(
        Operation::UpdateScale,
        1,
        GatewayError::Transport("connection reset".to_string()),
    );

    let err = sw.rollback("orders").await.unwrap_err();
    assert!(err.traffic_switched());
    assert!(matches!(
        err,
        SwitchError::Decommission { ref switched_to, ref replica_group, .. }
            if switched_to == "orders--blue" && replica_group == "orders--green"
    ));

    let svc = gw.service("orders").unwrap();
    assert_eq!(svc.routed_variant(), Some(Variant::Blue));
    assert_eq!(svc.previous_replica_group(), None);
    assert_eq!(gw.replica_group("orders--blue").unwrap().replicas, 2);
    assert_eq!(gw.replica_group("orders--green").unwrap().replicas, 2);
}
