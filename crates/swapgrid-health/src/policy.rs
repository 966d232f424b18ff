//! Poll cadence and attempt bound.

use std::time::Duration;

use swap_core::config::{ConfigError, SwapConfig};

/// Fixed-interval polling with a hard attempt bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep before each poll.
    pub interval: Duration,
    /// Polls allowed after the initial check.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 180,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Defaults overridden by the `[poll]` section of `swap.toml`.
    pub fn from_config(config: &SwapConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            interval: config.poll_interval()?.unwrap_or(defaults.interval),
            max_attempts: config.max_attempts().unwrap_or(defaults.max_attempts),
        })
    }

    /// Longest a single wait can sleep in total.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}
