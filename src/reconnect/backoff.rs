//! Exponential backoff delay calculation.

use std::time::Duration;

use crate::config::types::ReconnectConfig;

/// Computes retry delays from a [`ReconnectConfig`].
///
/// Delays are indexed by the number of attempts already made in the
/// current episode, so a manager can reset or rewind its retry count
/// without rebuilding any iterator state.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    max_retries: u32,
}

impl Backoff {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            multiplier: config.backoff_multiplier,
            max_retries: config.max_retries,
        }
    }

    /// Delay before the attempt following `retry_count` earlier attempts:
    /// `min(base * multiplier^retry_count, max)`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_millis = self.max_delay.as_millis() as f64;

        // powi overflows to infinity long before u64 does, min() keeps it bounded
        Duration::from_millis(millis.min(max_millis).round() as u64)
    }

    /// Returns the delay for the next attempt, or None if the retry budget
    /// is spent.
    pub fn next_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count >= self.max_retries {
            return None;
        }
        Some(self.delay_for(retry_count))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
