//! Cutover controller — repoint a service's selector.
//!
//! The service update is the one atomic step of a swap. If it fails the
//! service still routes to the old variant.

use tracing::warn;

use swap_core::{
    LabelSelector, ReplicaGroup, Service, Variant, PREVIOUS_REPLICA_GROUP_LABEL, VERSION_LABEL,
};
use swapgrid_gateway::ClusterGateway;

use crate::error::SwitchError;

/// The service routed to the other variant, remembering `active_name` for
/// rollback. Returns the variant the selector now targets.
pub fn switched_service(
    service: &Service,
    prior_tag: Option<&str>,
    active_name: &str,
) -> (Service, Variant) {
    let target = Variant::switch_target(prior_tag);
    if prior_tag.and_then(Variant::from_tag).is_none() {
        warn!(
            service = %service.name,
            prior_tag = prior_tag.unwrap_or(""),
            "active replica group has no recognised version tag, routing to blue"
        );
    }

    let mut updated = service.clone();
    updated.selector.insert(VERSION_LABEL, target.as_str());
    updated.labels.insert(
        PREVIOUS_REPLICA_GROUP_LABEL.to_string(),
        active_name.to_string(),
    );
    (updated, target)
}

/// The service routed back to `previous`, with the rollback marker removed.
///
/// The whole selector is replaced by the previous group's template labels,
/// not just the `version` key.
pub fn reverted_service(service: &Service, previous: &ReplicaGroup) -> Service {
    let mut updated = service.clone();
    updated.selector = LabelSelector::from(previous.template.labels.clone());
    updated.labels.remove(PREVIOUS_REPLICA_GROUP_LABEL);
    updated
}

/// Persist [`switched_service`].
pub async fn switch_traffic<G: ClusterGateway>(
    gateway: &G,
    service: &Service,
    prior_tag: Option<&str>,
    active_name: &str,
) -> Result<(Service, Variant), SwitchError> {
    let (updated, target) = switched_service(service, prior_tag, active_name);
    let persisted = gateway.update_service(&updated).await?;
    Ok((persisted, target))
}

/// Persist [`reverted_service`].
pub async fn revert_traffic<G: ClusterGateway>(
    gateway: &G,
    service: &Service,
    previous: &ReplicaGroup,
) -> Result<Service, SwitchError> {
    let updated = reverted_service(service, previous);
    Ok(gateway.update_service(&updated).await?)
}
