//! swapgrid-gateway — the switcher's view of the orchestrator.
//!
//! [`ClusterGateway`] is the only thing the switch/rollback core knows
//! about the control plane: a handful of CRUD calls over Services and
//! ReplicaGroups, bound to one namespace. Implementations translate
//! their transport's failures into [`GatewayError`], in particular the
//! typed `NotFound` that the delete-then-confirm step relies on.
//!
//! [`InMemoryGateway`] is a complete in-process cluster used by tests
//! and local dry runs.

pub mod error;
pub mod gateway;
pub mod memory;

pub use error::{GatewayError, GatewayResult, ResourceKind};
pub use gateway::{ClusterGateway, Deletion};
pub use memory::{InMemoryGateway, Operation};
