//! Error taxonomy for deploy and rollback.

use thiserror::Error;

use swap_core::Variant;
use swapgrid_gateway::GatewayError;
use swapgrid_health::WaitError;

/// Why a deploy or rollback stopped.
///
/// Every step fails fast; nothing is retried except the read side of the
/// two polling waits.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("no replica group backs service {service} (selector {selector})")]
    NotFound { service: String, selector: String },

    #[error("cannot tell whether replica group {0} is blue or green")]
    UnrecognizedVariant(String),

    /// The group's name suffix and `version` label disagree, so the
    /// selector would not follow the shadow.
    #[error(
        "replica group {replica_group} is named as {variant} but tagged version={version_tag}; \
         the switched selector would miss the new replica group"
    )]
    VariantMismatch {
        replica_group: String,
        variant: Variant,
        version_tag: String,
    },

    #[error("container {container} not found in replica group {replica_group}")]
    ContainerNotFound {
        container: String,
        replica_group: String,
    },

    #[error("couldn't create new replica group: {name} still present after {attempts} polls")]
    ProvisioningTimeout { name: String, attempts: u32 },

    #[error("replica group {name} didn't get up after {attempts} polls")]
    DeploymentNotReady { name: String, attempts: u32 },

    #[error("fail to rollback: cannot find old replica group on service {service}")]
    NoPreviousReplicaGroup { service: String },

    /// Cutover committed; only the cleanup scale-down failed.
    #[error("traffic now served by {switched_to}, but scaling down {replica_group} failed: {source}")]
    Decommission {
        switched_to: String,
        replica_group: String,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SwitchError {
    /// A lookup found nothing: either no backing replica group or a
    /// gateway `NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            SwitchError::NotFound { .. } => true,
            SwitchError::Gateway(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Whether the service selector was already moved when this error
    /// was raised.
    pub fn traffic_switched(&self) -> bool {
        matches!(self, SwitchError::Decommission { .. })
    }
}

impl From<WaitError> for SwitchError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::NotReady { name, attempts } => {
                SwitchError::DeploymentNotReady { name, attempts }
            }
            WaitError::StillPresent { name, attempts } => {
                SwitchError::ProvisioningTimeout { name, attempts }
            }
            WaitError::Gateway(e) => SwitchError::Gateway(e),
        }
    }
}
