//! Readiness and absence waits.

use thiserror::Error;
use tracing::{debug, info, warn};

use swapgrid_gateway::{ClusterGateway, GatewayError};

use crate::policy::PollPolicy;

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("replica group {name} did not become ready after {attempts} polls")]
    NotReady { name: String, attempts: u32 },

    #[error("replica group {name} still present after {attempts} polls")]
    StillPresent { name: String, attempts: u32 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Block until `name` reports every desired instance available.
///
/// `desired` overrides the target count; without it the group's own
/// observed replica count is the target. The first check happens
/// immediately and a fetch error there is returned as-is. Returns the
/// number of polls it took (0 when already ready).
pub async fn wait_ready<G: ClusterGateway>(
    gateway: &G,
    policy: &PollPolicy,
    name: &str,
    desired: Option<u32>,
) -> Result<u32, WaitError> {
    let group = gateway.get_replica_group(name).await?;
    if group.is_ready(desired) {
        debug!(replica_group = %name, "replica group already ready");
        return Ok(0);
    }

    info!(
        replica_group = %name,
        available = group.status.available_replicas,
        desired = desired.unwrap_or(group.status.replicas),
        "waiting for replica group to become ready"
    );

    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let group = match gateway.get_replica_group(name).await {
            Ok(g) => g,
            Err(e) => {
                debug!(replica_group = %name, attempt, error = %e, "readiness poll failed");
                continue;
            }
        };

        if group.is_ready(desired) {
            info!(replica_group = %name, attempt, "replica group ready");
            return Ok(attempt);
        }
        debug!(
            replica_group = %name,
            attempt,
            available = group.status.available_replicas,
            "replica group not ready yet"
        );
    }

    warn!(replica_group = %name, attempts = policy.max_attempts, "replica group never became ready");
    Err(WaitError::NotReady {
        name: name.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Block until the gateway reports `name` as not found.
///
/// Anything other than a typed `NotFound`, including other errors,
/// counts as still present. Returns the number of polls it took.
pub async fn wait_absent<G: ClusterGateway>(
    gateway: &G,
    policy: &PollPolicy,
    name: &str,
) -> Result<u32, WaitError> {
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        match gateway.find_replica_group(name).await {
            Ok(None) => {
                debug!(replica_group = %name, attempt, "replica group confirmed absent");
                return Ok(attempt);
            }
            Ok(Some(_)) => {
                debug!(replica_group = %name, attempt, "replica group still terminating");
            }
            Err(e) => {
                debug!(replica_group = %name, attempt, error = %e, "absence poll failed");
            }
        }
    }

    warn!(replica_group = %name, attempts = policy.max_attempts, "replica group never went away");
    Err(WaitError::StillPresent {
        name: name.to_string(),
        attempts: policy.max_attempts,
    })
}
