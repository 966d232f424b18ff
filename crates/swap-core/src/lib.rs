//! swap-core — shared types for the swapgrid blue/green switcher.
//!
//! Holds the orchestrator-neutral view of the two resource kinds the
//! switcher touches (Service, ReplicaGroup), the blue/green [`Variant`]
//! naming convention, exact-match [`LabelSelector`]s, and the `swap.toml`
//! configuration file.

pub mod config;
pub mod labels;
pub mod selector;
pub mod types;
pub mod variant;

pub use config::{ConfigError, SwapConfig};
pub use labels::{PREVIOUS_REPLICA_GROUP_LABEL, VERSION_LABEL};
pub use selector::{LabelSelector, SelectorError};
pub use types::*;
pub use variant::Variant;
