//! Reconnection state machine.
//!
//! - `backoff`: delay curve for successive attempts
//! - `listeners`: connectivity listener registry
//! - `manager`: scheduler and attempt executor (`ReconnectManager`)
//! - `state`: the snapshot handed out by `get_state()`

pub mod backoff;
mod listeners;
pub mod manager;
pub mod state;

pub use backoff::Backoff;
pub use listeners::Subscription;
pub use manager::{ReconnectFuture, ReconnectManager};
pub use state::ConnectionState;
