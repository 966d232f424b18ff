//! Error types for gateway calls.

use std::fmt;

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Which resource a gateway error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Service,
    ReplicaGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Service => f.write_str("service"),
            ResourceKind::ReplicaGroup => f.write_str("replica group"),
        }
    }
}

/// Errors surfaced by a [`ClusterGateway`](crate::ClusterGateway).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{kind} {name} not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("conflict updating {kind} {name}: the object has been modified")]
    Conflict { kind: ResourceKind, name: String },

    #[error("invalid {kind} {name}: {message}")]
    Invalid {
        kind: ResourceKind,
        name: String,
        message: String,
    },

    #[error("api error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        GatewayError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}
