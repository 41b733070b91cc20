//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    pub session: Option<SessionConfig>,
}

/// Retry policy for a reconnect manager.
///
/// Durations are stored as milliseconds so config files stay flat.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Attempts allowed per disconnection episode.
    pub max_retries: u32,
    /// Delay before the first attempt.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay.
    pub max_delay_ms: u64,
    /// Growth factor between successive delays.
    pub backoff_multiplier: f64,
    /// How long one attempt may run before it counts as failed.
    pub timeout_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            timeout_ms: 10_000,
        }
    }
}

impl ReconnectConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Liveness probe settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Health-check endpoint.
    pub url: String,
    /// Request timeout for a single probe.
    pub timeout_ms: u64,
    /// Polling interval used by the daemon's signal source.
    pub interval_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/api/health".to_string(),
            timeout_ms: 5000,
            interval_ms: 15_000,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Session identifiers attached to the manager state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub session_id: String,
    pub player_id: String,
}
