//! swapgrid-kube — [`ClusterGateway`](swapgrid_gateway::ClusterGateway)
//! over a Kubernetes control plane.
//!
//! ReplicaGroups are `apps/v1` Deployments; Services are `v1` Services.
//! Scaling goes through the Deployment `scale` subresource. Objects are
//! converted to the switcher's neutral types on read and the native
//! object rides along in `manifest`, so writes only overlay the fields
//! the switcher actually changes.

pub mod convert;
pub mod gateway;

pub use gateway::{ConnectError, KubeGateway};
