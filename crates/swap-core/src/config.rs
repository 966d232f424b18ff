//! swap.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid duration `{0}` (expected e.g. 500ms, 5s, 2m)")]
    Duration(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapConfig {
    pub cluster: Option<ClusterConfig>,
    pub poll: Option<PollConfig>,
    pub operation: Option<OperationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub namespace: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

/// Cadence shared by every polling wait.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval: Option<String>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Deadline for a whole deploy or rollback.
    pub timeout: Option<String>,
}

impl SwapConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.cluster.as_ref()?.namespace.as_deref()
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.cluster.as_ref()?.kubeconfig.as_deref()
    }

    pub fn poll_interval(&self) -> Result<Option<Duration>, ConfigError> {
        self.poll
            .as_ref()
            .and_then(|p| p.interval.as_deref())
            .map(parse_duration_checked)
            .transpose()
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.poll.as_ref()?.max_attempts
    }

    pub fn operation_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.operation
            .as_ref()
            .and_then(|o| o.timeout.as_deref())
            .map(parse_duration_checked)
            .transpose()
    }
}

/// Parse a duration string like "5s", "500ms", "1m", or plain seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

pub fn parse_duration_checked(s: &str) -> Result<Duration, ConfigError> {
    parse_duration(s).ok_or_else(|| ConfigError::Duration(s.to_string()))
}
