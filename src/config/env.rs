//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `TETHER_PROBE_URL` - Health-check endpoint
//! - `TETHER_MAX_RETRIES` - Attempts allowed per disconnection episode
//! - `TETHER_TIMEOUT_MS` - Per-attempt timeout
//! - `TETHER_SESSION_ID` / `TETHER_PLAYER_ID` - Session identifiers

use std::env;

use tracing::warn;

use crate::config::types::{SessionConfig, TetherConfig};

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "TETHER";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(config: TetherConfig) -> TetherConfig {
    apply_overrides_from(config, |name| env::var(format!("{}_{}", ENV_PREFIX, name)).ok())
}

/// Same as [`apply_env_overrides`] with an injectable variable lookup.
fn apply_overrides_from<F>(mut config: TetherConfig, lookup: F) -> TetherConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("PROBE_URL") {
        config.probe.url = url;
    }

    if let Some(retries) = lookup("MAX_RETRIES") {
        match retries.parse() {
            Ok(retries) => config.reconnect.max_retries = retries,
            Err(_) => warn!("Ignoring {}_MAX_RETRIES={:?}: not a number", ENV_PREFIX, retries),
        }
    }
    if let Some(timeout) = lookup("TIMEOUT_MS") {
        match timeout.parse() {
            Ok(timeout) => config.reconnect.timeout_ms = timeout,
            Err(_) => warn!("Ignoring {}_TIMEOUT_MS={:?}: not a number", ENV_PREFIX, timeout),
        }
    }

    // Session identifiers only apply as a pair
    if let (Some(session_id), Some(player_id)) = (lookup("SESSION_ID"), lookup("PLAYER_ID")) {
        config.session = Some(SessionConfig {
            session_id,
            player_id,
        });
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `TETHER_CONFIG` environment variable, otherwise returns "tether.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "tether.conf".to_string())
}
