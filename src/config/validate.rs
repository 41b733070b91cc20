//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::{ReconnectConfig, TetherConfig};

/// Validate a full configuration and return detailed errors.
pub fn validate_config(config: &TetherConfig) -> Result<(), ConfigError> {
    let mut errors = reconnect_errors(&config.reconnect);

    if config.probe.url.is_empty() {
        errors.push("probe.url is required".to_string());
    } else if !(config.probe.url.starts_with("http://") || config.probe.url.starts_with("https://")) {
        errors.push(format!(
            "probe.url must be an http(s) URL (got '{}')",
            config.probe.url
        ));
    }
    if config.probe.timeout_ms == 0 {
        errors.push("probe.timeout_ms must be non-zero".to_string());
    }
    if config.probe.interval_ms == 0 {
        errors.push("probe.interval_ms must be non-zero".to_string());
    }

    if let Some(ref session) = config.session {
        if session.session_id.is_empty() {
            errors.push("session.session_id must not be empty".to_string());
        }
        if session.player_id.is_empty() {
            errors.push("session.player_id must not be empty".to_string());
        }
    }

    into_result(errors)
}

/// Validate just the retry policy. Used when constructing a manager.
pub fn validate_reconnect(config: &ReconnectConfig) -> Result<(), ConfigError> {
    into_result(reconnect_errors(config))
}

fn reconnect_errors(config: &ReconnectConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.max_retries == 0 {
        errors.push("reconnect.max_retries must be greater than 0".to_string());
    }
    if config.base_delay_ms == 0 {
        errors.push("reconnect.base_delay_ms must be greater than 0".to_string());
    }
    if config.max_delay_ms < config.base_delay_ms {
        errors.push(format!(
            "reconnect.max_delay_ms ({}) must be >= base_delay_ms ({})",
            config.max_delay_ms, config.base_delay_ms
        ));
    }
    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier <= 1.0 {
        errors.push(format!(
            "reconnect.backoff_multiplier must be a finite number > 1 (got {})",
            config.backoff_multiplier
        ));
    }
    if config.timeout_ms == 0 {
        errors.push("reconnect.timeout_ms must be greater than 0".to_string());
    }

    errors
}

fn into_result(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
