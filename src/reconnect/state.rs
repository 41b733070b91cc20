//! Connectivity state snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connectivity state owned by a [`ReconnectManager`](super::ReconnectManager).
///
/// `get_state()` hands out clones; mutating one has no effect on the manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub is_connected: bool,
    /// Attempts made in the current disconnection episode.
    pub retry_count: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    /// When the pending attempt fires. `None` when nothing is scheduled.
    pub next_retry: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
    pub player_id: Option<String>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            is_connected: true,
            retry_count: 0,
            last_attempt: None,
            next_retry: None,
            session_id: None,
            player_id: None,
        }
    }
}
