//! The cluster gateway capability.

use std::future::Future;

use swap_core::{LabelSelector, ReplicaGroup, Scale, Service};

use crate::error::GatewayResult;

/// Outcome of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The object existed and deletion was accepted. It may still be
    /// visible for a while.
    Deleted,
    /// There was nothing to delete.
    Absent,
}

/// CRUD operations over Services and ReplicaGroups in one namespace.
///
/// Calls are issued one at a time by the switcher; implementations need
/// not coordinate concurrent use beyond being `Send + Sync`.
pub trait ClusterGateway: Send + Sync {
    /// Namespace every call is bound to.
    fn namespace(&self) -> &str;

    fn get_service(&self, name: &str) -> impl Future<Output = GatewayResult<Service>> + Send;

    /// Persist a modified service. Fails with `Conflict` if the stored
    /// object moved on since `service` was read.
    fn update_service(
        &self,
        service: &Service,
    ) -> impl Future<Output = GatewayResult<Service>> + Send;

    /// Replica groups whose labels satisfy `selector`. Empty is not an error.
    fn list_replica_groups(
        &self,
        selector: &LabelSelector,
    ) -> impl Future<Output = GatewayResult<Vec<ReplicaGroup>>> + Send;

    fn get_replica_group(
        &self,
        name: &str,
    ) -> impl Future<Output = GatewayResult<ReplicaGroup>> + Send;

    /// Create a new replica group. `group.resource_version` must be unset.
    fn create_replica_group(
        &self,
        group: &ReplicaGroup,
    ) -> impl Future<Output = GatewayResult<ReplicaGroup>> + Send;

    fn delete_replica_group(
        &self,
        name: &str,
    ) -> impl Future<Output = GatewayResult<Deletion>> + Send;

    fn get_scale(&self, name: &str) -> impl Future<Output = GatewayResult<Scale>> + Send;

    fn update_scale(
        &self,
        name: &str,
        scale: &Scale,
    ) -> impl Future<Output = GatewayResult<Scale>> + Send;

    /// Like [`get_replica_group`](Self::get_replica_group), with `NotFound`
    /// turned into `None`.
    fn find_replica_group(
        &self,
        name: &str,
    ) -> impl Future<Output = GatewayResult<Option<ReplicaGroup>>> + Send {
        async move {
            match self.get_replica_group(name).await {
                Ok(group) => Ok(Some(group)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        }
    }
}
