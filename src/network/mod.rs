//! Environment signal adapter and liveness probing.

pub mod monitor;
pub mod probe;
pub mod source;

pub use monitor::{Environment, NetworkMonitor};
pub use probe::HealthProbe;
pub use source::ProbeSignalSource;
