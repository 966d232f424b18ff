//! Shadow provisioner — build the inactive variant and bring it up.
//!
//! The shadow is always created fresh from the active group's current
//! definition. A same-named leftover is deleted first, and creation only
//! proceeds once the gateway confirms it is gone.

use tracing::{debug, info};

use swap_core::{ReplicaGroup, ReplicaStatus, Variant, VERSION_LABEL};
use swapgrid_gateway::{ClusterGateway, Deletion};
use swapgrid_health::{wait_absent, wait_ready, PollPolicy};

use crate::error::SwitchError;

/// What the new replica group should run.
#[derive(Debug, Clone, Copy)]
pub struct ShadowSpec<'a> {
    /// Name of the container whose image is replaced.
    pub container: &'a str,
    pub image: &'a str,
}

/// Derive the shadow definition from the active group.
///
/// The shadow gets the other variant's name and `version` tag (object
/// labels, instance-template labels, and the group's own selector), no
/// identity stamp or status, and `spec.image` on the matching container.
/// Other containers keep their images.
pub fn build_shadow(
    active: &ReplicaGroup,
    active_variant: Variant,
    spec: ShadowSpec<'_>,
) -> Result<ReplicaGroup, SwitchError> {
    let target = active_variant.other();

    let mut shadow = active.clone();
    shadow.name = active_variant.counterpart_name(&active.name);
    shadow
        .labels
        .insert(VERSION_LABEL.to_string(), target.as_str().to_string());
    shadow
        .template
        .labels
        .insert(VERSION_LABEL.to_string(), target.as_str().to_string());
    shadow.selector.insert(VERSION_LABEL, target.as_str());
    shadow.resource_version = None;
    shadow.status = ReplicaStatus::default();

    let container = shadow
        .container_mut(spec.container)
        .ok_or_else(|| SwitchError::ContainerNotFound {
            container: spec.container.to_string(),
            replica_group: active.name.clone(),
        })?;
    container.image = spec.image.to_string();

    Ok(shadow)
}

/// Create the shadow for `active_name` and wait until it is fully available.
///
/// A shadow that never becomes ready is left in place for inspection.
pub async fn provision_shadow<G: ClusterGateway>(
    gateway: &G,
    policy: &PollPolicy,
    active_name: &str,
    active_variant: Variant,
    spec: ShadowSpec<'_>,
) -> Result<ReplicaGroup, SwitchError> {
    // Work from the stored definition, not whatever the caller listed.
    let active = gateway.get_replica_group(active_name).await?;
    let shadow = build_shadow(&active, active_variant, spec)?;

    match gateway.delete_replica_group(&shadow.name).await? {
        Deletion::Deleted => {
            info!(replica_group = %shadow.name, "deleting stale replica group");
        }
        Deletion::Absent => {
            debug!(replica_group = %shadow.name, "no stale replica group");
        }
    }
    wait_absent(gateway, policy, &shadow.name).await?;

    info!(
        replica_group = %shadow.name,
        image = %spec.image,
        container = %spec.container,
        replicas = shadow.replicas,
        "creating replica group"
    );
    let created = gateway.create_replica_group(&shadow).await?;

    wait_ready(gateway, policy, &created.name, Some(created.replicas)).await?;
    Ok(created)
}
