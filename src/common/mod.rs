//! Common utilities and types shared across the crate.

pub mod error;
pub mod types;

pub use error::{ConfigError, ProbeError};
pub use types::{ConnectionPhase, NetworkSignal};
