//! Effective settings: swap.toml values overridden by flags and env.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::debug;

use swap_core::config::{SwapConfig, parse_duration_checked};
use swapgrid_health::PollPolicy;
use swapgrid_kube::KubeGateway;
use swapgrid_rollout::{SwitchError, Switcher};

use crate::{GlobalArgs, TargetArgs};

const DEFAULT_CONFIG: &str = "swap.toml";
const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub namespace: String,
    pub kubeconfig: Option<PathBuf>,
    pub policy: PollPolicy,
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Load the config file (explicit `--config`, else `./swap.toml` if it
    /// exists) and apply the command-line overrides.
    pub fn resolve(global: &GlobalArgs, target: &TargetArgs) -> anyhow::Result<Self> {
        let config = match &global.config {
            Some(path) => SwapConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => {
                debug!(path = DEFAULT_CONFIG, "using config file");
                SwapConfig::from_file(Path::new(DEFAULT_CONFIG))?
            }
            None => SwapConfig::default(),
        };
        Self::merge(&config, global, target)
    }

    pub fn merge(config: &SwapConfig, global: &GlobalArgs, target: &TargetArgs) -> anyhow::Result<Self> {
        let mut policy = PollPolicy::from_config(config)?;
        if let Some(interval) = &global.poll_interval {
            policy.interval = parse_duration_checked(interval)?;
        }
        if let Some(max_attempts) = global.max_attempts {
            policy.max_attempts = max_attempts;
        }

        let timeout = match &global.timeout {
            Some(t) => Some(parse_duration_checked(t)?),
            None => config.operation_timeout()?,
        };

        Ok(Self {
            namespace: target
                .namespace
                .clone()
                .or_else(|| config.namespace().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            kubeconfig: target
                .kubeconfig
                .clone()
                .or_else(|| config.kubeconfig().map(Path::to_path_buf)),
            policy,
            timeout,
        })
    }

    pub async fn switcher(&self) -> anyhow::Result<Switcher<KubeGateway>> {
        let gateway = KubeGateway::connect(self.kubeconfig.as_deref(), &self.namespace)
            .await
            .context("failed to build kubernetes client")?;
        Ok(Switcher::new(gateway, self.policy))
    }

    /// Run `op`, giving up once the configured timeout elapses.
    pub async fn bounded<T, F>(&self, op: F) -> anyhow::Result<T>
    where
        F: Future<Output = Result<T, SwitchError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_| anyhow!("operation timed out after {limit:?}"))?
                .map_err(Into::into),
            None => op.await.map_err(Into::into),
        }
    }
}
