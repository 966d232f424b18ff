//! Switcher — the deploy and rollback pipelines.
//!
//! Each pipeline runs its steps strictly in order, one gateway call at a
//! time, and stops at the first error. The only state carried between a
//! deploy and a later rollback is the `previous-replica-group` label on
//! the service.

use std::fmt;

use serde::Serialize;
use tracing::info;

use swap_core::{LabelSelector, Variant};
use swapgrid_gateway::ClusterGateway;
use swapgrid_health::{wait_ready, PollPolicy};

use crate::cutover::{revert_traffic, switch_traffic};
use crate::decommission::{scale_to, scale_to_zero};
use crate::error::SwitchError;
use crate::provisioner::{provision_shadow, ShadowSpec};
use crate::resolver::resolve_active;

/// Step a pipeline is entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPhase {
    /// Reading the service and the replica group it routes to.
    Resolving,
    /// Creating the shadow and waiting for it.
    Provisioning,
    /// Scaling the previous replica group back up (rollback).
    Restoring,
    /// Updating the service selector.
    CuttingOver,
    /// Scaling the replaced replica group to zero.
    Decommissioning,
    Completed,
}

impl fmt::Display for SwitchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchPhase::Resolving => "resolving",
            SwitchPhase::Provisioning => "provisioning",
            SwitchPhase::Restoring => "restoring",
            SwitchPhase::CuttingOver => "cutting_over",
            SwitchPhase::Decommissioning => "decommissioning",
            SwitchPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Inputs for a deploy.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub service: String,
    pub image: String,
    /// Container in the replica group template whose image is replaced.
    pub container: String,
}

/// Outcome of a successful deploy.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeployReport {
    pub service: String,
    pub previous_replica_group: String,
    pub previous_variant: Variant,
    pub replica_group: String,
    /// Variant the service selector now targets.
    pub variant: Variant,
    pub image: String,
    pub replicas: u32,
}

/// Outcome of a successful rollback.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RollbackReport {
    pub service: String,
    pub restored_replica_group: String,
    pub restored_replicas: u32,
    pub retired_replica_group: String,
    pub selector: LabelSelector,
}

/// Runs deploys and rollbacks against one gateway.
pub struct Switcher<G> {
    gateway: G,
    policy: PollPolicy,
}

impl<G: ClusterGateway> Switcher<G> {
    pub fn new(gateway: G, policy: PollPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    fn enter(&self, service: &str, phase: SwitchPhase, message: &str) {
        info!(
            %service,
            namespace = %self.gateway.namespace(),
            %phase,
            "{message}"
        );
    }

    /// Replace the service's live replica group with one running `image`.
    ///
    /// The active group's name suffix and `version` label must agree on
    /// which variant comes next; otherwise nothing is touched.
    ///
    /// On success the service routes to the new variant, records the old
    /// group for rollback, and the old group is scaled to zero. A failure
    /// in that last scale-down is reported as [`SwitchError::Decommission`]
    /// after traffic has already moved.
    pub async fn deploy(&self, req: &DeployRequest) -> Result<DeployReport, SwitchError> {
        let service = req.service.as_str();

        self.enter(service, SwitchPhase::Resolving, "getting the service");
        let active = resolve_active(&self.gateway, service).await?;
        let active_variant = active.variant()?;
        let prior_tag = active.group.version_tag();
        if Variant::switch_target(prior_tag) != active_variant.other() {
            return Err(SwitchError::VariantMismatch {
                replica_group: active.group.name.clone(),
                variant: active_variant,
                version_tag: prior_tag.unwrap_or_default().to_string(),
            });
        }

        self.enter(service, SwitchPhase::Provisioning, "creating new replica group");
        let shadow = provision_shadow(
            &self.gateway,
            &self.policy,
            &active.group.name,
            active_variant,
            ShadowSpec {
                container: &req.container,
                image: &req.image,
            },
        )
        .await?;

        self.enter(service, SwitchPhase::CuttingOver, "pointing service to new replica group");
        let (_, routed) =
            switch_traffic(&self.gateway, &active.service, prior_tag, &active.group.name).await?;

        self.enter(service, SwitchPhase::Decommissioning, "scaling down previous replica group");
        scale_to_zero(&self.gateway, &active.group.name)
            .await
            .map_err(|source| SwitchError::Decommission {
                switched_to: shadow.name.clone(),
                replica_group: active.group.name.clone(),
                source,
            })?;

        self.enter(service, SwitchPhase::Completed, "deploy finished");
        Ok(DeployReport {
            service: service.to_string(),
            previous_replica_group: active.group.name,
            previous_variant: active_variant,
            replica_group: shadow.name,
            variant: routed,
            image: req.image.clone(),
            replicas: shadow.replicas,
        })
    }

    /// Undo the last deploy of `service`.
    ///
    /// Fails with [`SwitchError::NoPreviousReplicaGroup`], before touching
    /// anything, when the service carries no rollback marker.
    pub async fn rollback(&self, service: &str) -> Result<RollbackReport, SwitchError> {
        self.enter(service, SwitchPhase::Resolving, "getting the service");
        let current = resolve_active(&self.gateway, service).await?;

        let previous_name = current
            .service
            .previous_replica_group()
            .ok_or_else(|| SwitchError::NoPreviousReplicaGroup {
                service: service.to_string(),
            })?
            .to_string();
        let previous = self.gateway.get_replica_group(&previous_name).await?;

        self.enter(service, SwitchPhase::Restoring, "scaling the previous replica group");
        let replicas = current.group.replicas;
        scale_to(&self.gateway, &previous.name, replicas).await?;
        wait_ready(&self.gateway, &self.policy, &previous.name, Some(replicas)).await?;

        self.enter(service, SwitchPhase::CuttingOver, "pointing service to the previous replica group");
        let reverted = revert_traffic(&self.gateway, &current.service, &previous).await?;

        self.enter(service, SwitchPhase::Decommissioning, "scaling down replica group");
        scale_to_zero(&self.gateway, &current.group.name)
            .await
            .map_err(|source| SwitchError::Decommission {
                switched_to: previous.name.clone(),
                replica_group: current.group.name.clone(),
                source,
            })?;

        self.enter(service, SwitchPhase::Completed, "rollback finished");
        Ok(RollbackReport {
            service: service.to_string(),
            restored_replica_group: previous.name,
            restored_replicas: replicas,
            retired_replica_group: current.group.name,
            selector: reverted.selector,
        })
    }
}
