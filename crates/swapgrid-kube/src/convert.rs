//! Conversions between Kubernetes objects and swapgrid types.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::{Scale as KubeScale, ScaleSpec};
use k8s_openapi::api::core::v1::{Container as KubeContainer, Service as KubeService};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use swap_core::{Container, InstanceTemplate, ReplicaGroup, ReplicaStatus, Scale, Service};
use swapgrid_gateway::{GatewayError, ResourceKind};

fn count(value: Option<i32>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

fn replicas_field(value: u32) -> Option<i32> {
    Some(i32::try_from(value).unwrap_or(i32::MAX))
}

// ── Deployment ↔ ReplicaGroup ─────────────────────────────────────

pub fn replica_group_from_deployment(d: &Deployment) -> ReplicaGroup {
    let spec = d.spec.as_ref();
    let template_labels = spec
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.clone())
        .unwrap_or_default();
    let containers = spec
        .and_then(|s| s.template.spec.as_ref())
        .map(|pod| {
            pod.containers
                .iter()
                .map(|c| Container {
                    name: c.name.clone(),
                    image: c.image.clone().unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    let status = d.status.as_ref();

    ReplicaGroup {
        name: d.metadata.name.clone().unwrap_or_default(),
        namespace: d.metadata.namespace.clone().unwrap_or_default(),
        labels: d.metadata.labels.clone().unwrap_or_default(),
        // The API server defaults an unset replica count to 1.
        replicas: spec
            .map(|s| count(Some(s.replicas.unwrap_or(1))))
            .unwrap_or(0),
        selector: spec
            .and_then(|s| s.selector.match_labels.clone())
            .unwrap_or_default()
            .into(),
        template: InstanceTemplate {
            labels: template_labels,
            containers,
        },
        status: ReplicaStatus {
            replicas: count(status.and_then(|s| s.replicas)),
            available_replicas: count(status.and_then(|s| s.available_replicas)),
        },
        resource_version: d.metadata.resource_version.clone(),
        manifest: serde_json::to_value(d).ok(),
    }
}

/// Overlay `group` onto its carried manifest.
///
/// A group without a resource version is headed for creation, so the
/// server-assigned identity fields and status are dropped too.
pub fn deployment_from_replica_group(group: &ReplicaGroup) -> Deployment {
    let mut d: Deployment = group
        .manifest
        .clone()
        .and_then(|m| serde_json::from_value(m).ok())
        .unwrap_or_default();

    d.metadata.name = Some(group.name.clone());
    d.metadata.namespace = Some(group.namespace.clone());
    d.metadata.labels = Some(group.labels.clone());
    d.metadata.resource_version = group.resource_version.clone();
    if group.resource_version.is_none() {
        d.metadata.uid = None;
        d.metadata.creation_timestamp = None;
        d.metadata.generation = None;
        d.metadata.managed_fields = None;
        d.metadata.owner_references = None;
        d.status = None;
    }

    let spec = d.spec.get_or_insert_with(Default::default);
    spec.replicas = replicas_field(group.replicas);
    spec.selector.match_labels = Some(group.selector.as_map().clone());

    let meta = spec.template.metadata.get_or_insert_with(Default::default);
    meta.labels = Some(group.template.labels.clone());

    let pod = spec.template.spec.get_or_insert_with(Default::default);
    for container in &group.template.containers {
        match pod.containers.iter_mut().find(|c| c.name == container.name) {
            Some(existing) => existing.image = Some(container.image.clone()),
            None => pod.containers.push(KubeContainer {
                name: container.name.clone(),
                image: Some(container.image.clone()),
                ..Default::default()
            }),
        }
    }

    d
}

// ── Service ───────────────────────────────────────────────────────

pub fn service_from_kube(s: &KubeService) -> Service {
    Service {
        name: s.metadata.name.clone().unwrap_or_default(),
        namespace: s.metadata.namespace.clone().unwrap_or_default(),
        labels: s.metadata.labels.clone().unwrap_or_default(),
        selector: s
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.clone())
            .unwrap_or_default()
            .into(),
        resource_version: s.metadata.resource_version.clone(),
        manifest: serde_json::to_value(s).ok(),
    }
}

pub fn kube_service(service: &Service) -> KubeService {
    let mut s: KubeService = service
        .manifest
        .clone()
        .and_then(|m| serde_json::from_value(m).ok())
        .unwrap_or_default();

    s.metadata.name = Some(service.name.clone());
    s.metadata.namespace = Some(service.namespace.clone());
    s.metadata.labels = Some(service.labels.clone());
    s.metadata.resource_version = service.resource_version.clone();
    s.spec.get_or_insert_with(Default::default).selector =
        Some(service.selector.as_map().clone());
    s
}

// ── Scale ─────────────────────────────────────────────────────────

pub fn scale_from_kube(name: &str, s: &KubeScale) -> Scale {
    Scale {
        name: name.to_string(),
        replicas: count(s.spec.as_ref().and_then(|spec| spec.replicas)),
        resource_version: s.metadata.resource_version.clone(),
    }
}

pub fn kube_scale(namespace: &str, scale: &Scale) -> KubeScale {
    KubeScale {
        metadata: ObjectMeta {
            name: Some(scale.name.clone()),
            namespace: Some(namespace.to_string()),
            resource_version: scale.resource_version.clone(),
            ..Default::default()
        },
        spec: Some(ScaleSpec {
            replicas: replicas_field(scale.replicas),
        }),
        status: None,
    }
}

// ── Errors ────────────────────────────────────────────────────────

/// Map a kube-rs error onto the gateway taxonomy by status reason.
pub fn map_kube_error(err: kube::Error, kind: ResourceKind, name: &str) -> GatewayError {
    match err {
        kube::Error::Api(resp) => match resp.reason.as_str() {
            "NotFound" => GatewayError::not_found(kind, name),
            "AlreadyExists" => GatewayError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            "Conflict" => GatewayError::Conflict {
                kind,
                name: name.to_string(),
            },
            "Invalid" => GatewayError::Invalid {
                kind,
                name: name.to_string(),
                message: resp.message,
            },
            _ => GatewayError::Api {
                code: resp.code,
                message: resp.message,
            },
        },
        other => GatewayError::Transport(other.to_string()),
    }
}
