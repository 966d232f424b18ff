//! Domain types for the two resource kinds the switcher manipulates.
//!
//! These are orchestrator-neutral: a gateway translates its native
//! objects into these and back. Fields the switcher never reads travel
//! untouched in `manifest`, so a cloned replica group keeps everything
//! the source group had (ports, env, probes, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::{PREVIOUS_REPLICA_GROUP_LABEL, VERSION_LABEL};
use crate::selector::LabelSelector;
use crate::variant::Variant;

/// Label key → value.
pub type Labels = BTreeMap<String, String>;

// ── Service ───────────────────────────────────────────────────────

/// Stable traffic endpoint routing to instances matching `selector`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    /// Object labels. Holds the `previous-replica-group` state label.
    pub labels: Labels,
    /// Routing rule: instances whose labels match every pair get traffic.
    pub selector: LabelSelector,
    /// Optimistic-concurrency stamp assigned by the orchestrator.
    pub resource_version: Option<String>,
    /// Gateway-native object, carried opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<serde_json::Value>,
}

impl Service {
    /// Variant the selector currently routes to, if its `version` tag is
    /// recognised.
    pub fn routed_variant(&self) -> Option<Variant> {
        self.selector.get(VERSION_LABEL).and_then(Variant::from_tag)
    }

    /// Replica group recorded by the last deploy, if a rollback is possible.
    pub fn previous_replica_group(&self) -> Option<&str> {
        self.labels
            .get(PREVIOUS_REPLICA_GROUP_LABEL)
            .map(String::as_str)
    }
}

// ── ReplicaGroup ──────────────────────────────────────────────────

/// Named, scalable set of identical worker instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicaGroup {
    pub name: String,
    pub namespace: String,
    /// Object labels; list calls match against these.
    pub labels: Labels,
    /// Desired instance count.
    pub replicas: u32,
    /// Which instances this group owns.
    pub selector: LabelSelector,
    pub template: InstanceTemplate,
    pub status: ReplicaStatus,
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<serde_json::Value>,
}

/// Template every instance of a replica group is stamped from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceTemplate {
    /// Labels applied to each instance; the service selector matches these.
    pub labels: Labels,
    pub containers: Vec<Container>,
}

/// A named container and the image it runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub image: String,
}

/// Observed replica counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicaStatus {
    /// Instance count the orchestrator is currently driving toward.
    pub replicas: u32,
    /// Instances that are ready to serve.
    pub available_replicas: u32,
}

impl ReplicaGroup {
    /// Variant by name suffix, falling back to the `version` label.
    pub fn variant(&self) -> Option<Variant> {
        Variant::from_name(&self.name).or_else(|| self.version_tag().and_then(Variant::from_tag))
    }

    /// Raw `version` label value, recognised or not.
    pub fn version_tag(&self) -> Option<&str> {
        self.labels.get(VERSION_LABEL).map(String::as_str)
    }

    /// Whether observed availability matches `desired`, or the observed
    /// replica count when no override is given.
    pub fn is_ready(&self, desired: Option<u32>) -> bool {
        let target = desired.unwrap_or(self.status.replicas);
        self.status.available_replicas == target
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.template.containers.iter().find(|c| c.name == name)
    }

    pub fn container_mut(&mut self, name: &str) -> Option<&mut Container> {
        self.template.containers.iter_mut().find(|c| c.name == name)
    }

    /// Composite key, `{namespace}/{name}`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// ── Scale ─────────────────────────────────────────────────────────

/// Scale sub-resource of a replica group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scale {
    pub name: String,
    pub replicas: u32,
    pub resource_version: Option<String>,
}
