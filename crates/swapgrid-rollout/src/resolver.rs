//! Variant resolver — which replica group is a service routed to?

use tracing::{info, warn};

use swap_core::{ReplicaGroup, Service, Variant};
use swapgrid_gateway::ClusterGateway;

use crate::error::SwitchError;

/// A service together with the replica group its selector matches.
#[derive(Debug, Clone)]
pub struct ActiveReplicaGroup {
    pub service: Service,
    pub group: ReplicaGroup,
}

impl ActiveReplicaGroup {
    /// Variant of the active group, by name suffix then `version` label.
    pub fn variant(&self) -> Result<Variant, SwitchError> {
        self.group
            .variant()
            .ok_or_else(|| SwitchError::UnrecognizedVariant(self.group.name.clone()))
    }
}

/// Fetch `service_name` and the replica group its full selector matches.
///
/// An empty match is `SwitchError::NotFound`. More than one match should
/// not happen outside a half-finished swap; the first one wins.
pub async fn resolve_active<G: ClusterGateway>(
    gateway: &G,
    service_name: &str,
) -> Result<ActiveReplicaGroup, SwitchError> {
    let service = gateway.get_service(service_name).await?;

    info!(service = %service_name, selector = %service.selector, "getting replica groups");
    let mut groups = gateway.list_replica_groups(&service.selector).await?;

    if groups.len() > 1 {
        warn!(
            service = %service_name,
            matched = groups.len(),
            "selector matches more than one replica group, using the first"
        );
    }
    if groups.is_empty() {
        return Err(SwitchError::NotFound {
            service: service_name.to_string(),
            selector: service.selector.encode(),
        });
    }
    let group = groups.swap_remove(0);

    Ok(ActiveReplicaGroup { service, group })
}
