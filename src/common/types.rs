//! Shared types used across the crate.

use std::fmt;

/// Connectivity signal emitted by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSignal {
    /// Connectivity restored.
    Online,
    /// Connectivity lost.
    Offline,
    /// The client became visible / foregrounded again.
    Visible,
    /// The client was hidden / backgrounded.
    Hidden,
}

/// Position of a manager on the connectivity axis.
///
/// Derived from the connection flag and whether an attempt is pending;
/// never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connected,
    /// Disconnected with a retry timer or attempt pending.
    Scheduling,
    /// Disconnected and quiescent. Recoverable via `force_reconnect`.
    Stopped,
}

impl ConnectionPhase {
    pub fn from_flags(is_connected: bool, pending: bool) -> Self {
        match (is_connected, pending) {
            (true, _) => Self::Connected,
            (false, true) => Self::Scheduling,
            (false, false) => Self::Stopped,
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Scheduling => "scheduling",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_flags() {
        assert_eq!(ConnectionPhase::from_flags(true, false), ConnectionPhase::Connected);
        // A stale pending flag never overrides a live connection
        assert_eq!(ConnectionPhase::from_flags(true, true), ConnectionPhase::Connected);
        assert_eq!(ConnectionPhase::from_flags(false, true), ConnectionPhase::Scheduling);
        assert_eq!(ConnectionPhase::from_flags(false, false), ConnectionPhase::Stopped);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ConnectionPhase::Scheduling.to_string(), "scheduling");
    }
}
