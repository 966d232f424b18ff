//! Decommissioner — set a replica group's desired count via its scale
//! sub-resource.
//!
//! Retiring a group scales it to zero rather than deleting it, so a later
//! rollback can bring it back. No wait follows a scale-down.

use tracing::info;

use swap_core::Scale;
use swapgrid_gateway::{ClusterGateway, GatewayResult};

/// Set `name`'s desired replica count to `replicas`.
pub async fn scale_to<G: ClusterGateway>(
    gateway: &G,
    name: &str,
    replicas: u32,
) -> GatewayResult<Scale> {
    let mut scale = gateway.get_scale(name).await?;
    info!(replica_group = %name, from = scale.replicas, to = replicas, "scaling replica group");
    scale.replicas = replicas;
    gateway.update_scale(name, &scale).await
}

/// Scale `name` to zero.
pub async fn scale_to_zero<G: ClusterGateway>(gateway: &G, name: &str) -> GatewayResult<Scale> {
    scale_to(gateway, name, 0).await
}
