//! Tether - connection-resilience core
//!
//! Detects loss of connectivity, retries a caller-supplied reconnect
//! operation with bounded exponential backoff, and broadcasts connectivity
//! transitions to listeners. Tether never opens a transport itself.
//!
//! ## Module Structure
//!
//! - `reconnect`: the reconnect state machine (`ReconnectManager`)
//! - `network`: environment signal adapter (`NetworkMonitor`) and the
//!   HTTP liveness probe
//! - `config`: HOCON configuration, `TETHER_*` overrides, validation
//! - `common`: errors and shared types
//!
//! ```no_run
//! use tether::{ReconnectConfig, ReconnectManager};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let manager = ReconnectManager::new(ReconnectConfig::default())?;
//! manager.set_reconnect_callback(|| async {
//!     // re-open the session here
//!     anyhow::Ok(true)
//! });
//! let subscription = manager.on_connection_change(|connected| {
//!     println!("connected: {}", connected);
//! });
//!
//! manager.handle_disconnection();
//! # subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod network;
pub mod reconnect;

pub use common::{ConfigError, ConnectionPhase, NetworkSignal, ProbeError};
pub use config::{ProbeConfig, ReconnectConfig, SessionConfig, TetherConfig};
pub use network::{Environment, HealthProbe, NetworkMonitor, ProbeSignalSource};
pub use reconnect::{ConnectionState, ReconnectManager, Subscription};
