//! Reconnect scheduler and attempt executor.
//!
//! A [`ReconnectManager`] owns connectivity state for one transport. When
//! told the transport dropped it notifies listeners, then retries the
//! installed reconnect operation with exponential backoff until it
//! succeeds or the retry budget runs out.
//!
//! At most one attempt is pending at a time. Every scheduled attempt gets a
//! generation number; an attempt whose generation is no longer the pending
//! one (because it was cancelled, superseded or the manager reset) has its
//! outcome discarded.
//!
//! Attempts run on the tokio runtime the manager was created (or last given
//! an operation) on, so the transport may report a drop from any thread.
//! Each state transition also carries a sequence number; a notification
//! that has been overtaken by a newer transition stops reaching listeners.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::common::error::ConfigError;
use crate::common::types::ConnectionPhase;
use crate::config::types::ReconnectConfig;
use crate::config::validate::validate_reconnect;
use crate::reconnect::backoff::Backoff;
use crate::reconnect::listeners::{panic_message, ListenerSet, Subscription};
use crate::reconnect::state::ConnectionState;

/// Future returned by a reconnect operation. `Ok(true)` means reconnected.
pub type ReconnectFuture = BoxFuture<'static, anyhow::Result<bool>>;

type ReconnectOp = Arc<dyn Fn() -> ReconnectFuture + Send + Sync>;

/// Handle to a reconnect state machine.
///
/// Cloning is cheap and every clone drives the same state. Construct one in
/// the application's composition root and hand clones to whoever needs it.
#[derive(Clone)]
pub struct ReconnectManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: ReconnectConfig,
    backoff: Backoff,
    shared: Mutex<Shared>,
    listeners: Arc<ListenerSet>,
}

#[derive(Default)]
struct Shared {
    state: ConnectionState,
    reconnect_op: Option<ReconnectOp>,
    pending: Option<PendingAttempt>,
    generation: u64,
    transition: u64,
    runtime: Option<Handle>,
}

struct PendingAttempt {
    generation: u64,
    task: JoinHandle<()>,
}

/// Why an attempt did not reconnect.
#[derive(Debug, Error)]
enum AttemptFailure {
    #[error("operation reported failure")]
    Refused,
    #[error("{0:#}")]
    Failed(anyhow::Error),
    #[error("operation panicked: {0}")]
    Panicked(String),
    #[error("timed out after {0}ms")]
    TimedOut(u64),
}

impl ReconnectManager {
    /// Create a manager in the connected state.
    ///
    /// Fails if the config breaks any of its bounds.
    pub fn new(config: ReconnectConfig) -> Result<Self, ConfigError> {
        validate_reconnect(&config)?;

        Ok(Self {
            inner: Arc::new(Inner {
                backoff: Backoff::new(&config),
                config,
                shared: Mutex::new(Shared {
                    runtime: Handle::try_current().ok(),
                    ..Shared::default()
                }),
                listeners: Arc::new(ListenerSet::default()),
            }),
        })
    }

    /// Install the operation invoked on every attempt. A replacement takes
    /// effect from the next attempt on.
    pub fn set_reconnect_callback<F, Fut>(&self, op: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let op: ReconnectOp = Arc::new(move || op().boxed());
        let mut shared = self.inner.lock();
        shared.reconnect_op = Some(op);
        if let Ok(runtime) = Handle::try_current() {
            shared.runtime = Some(runtime);
        }
    }

    /// Register a connectivity listener.
    ///
    /// Listeners run synchronously on whichever task changed the state, so
    /// keep them short. A panicking listener is logged and skipped.
    ///
    /// When transitions race across threads, a listener may miss an
    /// intermediate value, but the last value it sees matches the state.
    pub fn on_connection_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.listeners.insert(Arc::new(listener))
    }

    /// Attach session identifiers to the state. Connectivity is untouched.
    pub fn set_session(&self, session_id: impl Into<String>, player_id: impl Into<String>) {
        let mut shared = self.inner.lock();
        shared.state.session_id = Some(session_id.into());
        shared.state.player_id = Some(player_id.into());
    }

    /// The transport dropped. No-op when already disconnected.
    pub fn handle_disconnection(&self) {
        let transition = {
            let mut shared = self.inner.lock();
            if !shared.state.is_connected {
                debug!("Ignoring disconnection: already disconnected");
                return;
            }
            shared.state.is_connected = false;
            shared.next_transition()
        };

        info!("Connection lost");
        notify(&self.inner, false, transition);

        let mut shared = self.inner.lock();
        // A listener may already have reported the connection back
        if !shared.state.is_connected {
            schedule(&self.inner, &mut shared);
        }
    }

    /// The transport is back. No-op when already connected.
    pub fn handle_reconnection(&self) {
        let transition = {
            let mut shared = self.inner.lock();
            if shared.state.is_connected {
                debug!("Ignoring reconnection: already connected");
                None
            } else {
                mark_connected(&mut shared);
                Some(shared.next_transition())
            }
        };

        if let Some(transition) = transition {
            info!("Connection restored");
            notify(&self.inner, true, transition);
        }
    }

    /// Start a fresh retry episode regardless of the connectivity flag.
    pub fn force_reconnect(&self) {
        let mut shared = self.inner.lock();
        info!("Forcing reconnect");
        shared.state.retry_count = 0;
        schedule(&self.inner, &mut shared);
    }

    /// Cancel any pending attempt and reset the retry budget.
    ///
    /// Leaves the connectivity flag alone and notifies no one.
    pub fn stop_reconnect(&self) {
        let mut shared = self.inner.lock();
        if shared.pending.is_some() {
            info!("Stopping reconnect attempts");
        }
        cancel_pending(&mut shared);
        shared.state.retry_count = 0;
        shared.state.next_retry = None;
    }

    /// Snapshot of the current state.
    pub fn get_state(&self) -> ConnectionState {
        self.inner.lock().state.clone()
    }

    /// True while disconnected with an attempt scheduled or in flight.
    pub fn is_reconnecting(&self) -> bool {
        let shared = self.inner.lock();
        !shared.state.is_connected && shared.pending.is_some()
    }

    /// Derived phase of the state machine.
    pub fn phase(&self) -> ConnectionPhase {
        let shared = self.inner.lock();
        ConnectionPhase::from_flags(shared.state.is_connected, shared.pending.is_some())
    }

    /// Return to construction defaults: cancels the pending attempt, drops
    /// the reconnect operation and every listener.
    pub fn reset(&self) {
        {
            let mut shared = self.inner.lock();
            cancel_pending(&mut shared);
            shared.state = ConnectionState::default();
            shared.reconnect_op = None;
            shared.next_transition();
        }
        self.inner.listeners.clear();
        debug!("Reconnect manager reset");
    }

    /// The validated reconnect config.
    pub fn config(&self) -> &ReconnectConfig {
        &self.inner.config
    }

    /// Delay used before the attempt that follows `retry_count` failures.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.inner.backoff.delay_for(retry_count)
    }
}

impl std::fmt::Debug for ReconnectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectManager")
            .field("config", &self.inner.config)
            .field("state", &self.get_state())
            .field("phase", &self.phase())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        // State is only mutated in short, panic-free sections
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let shared = self
            .shared
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cancel_pending(shared);
    }
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation)
    }

    fn next_transition(&mut self) -> u64 {
        self.transition += 1;
        self.transition
    }
}

/// Fan `connected` out to listeners until a newer transition supersedes it.
fn notify(inner: &Inner, connected: bool, transition: u64) {
    inner
        .listeners
        .notify_while(connected, || inner.lock().transition == transition);
}

fn mark_connected(shared: &mut Shared) {
    cancel_pending(shared);
    shared.state.is_connected = true;
    shared.state.retry_count = 0;
    shared.state.next_retry = None;
}

fn cancel_pending(shared: &mut Shared) {
    if let Some(pending) = shared.pending.take() {
        pending.task.abort();
    }
}

/// Schedule the next attempt if budget and an operation are available.
fn schedule(inner: &Arc<Inner>, shared: &mut Shared) {
    let Some(delay) = inner.backoff.next_delay(shared.state.retry_count) else {
        debug!(
            "Not scheduling: retry budget spent ({}/{})",
            shared.state.retry_count,
            inner.backoff.max_retries()
        );
        return;
    };
    if shared.reconnect_op.is_none() {
        debug!("Not scheduling: no reconnect operation installed");
        return;
    }
    let Some(runtime) = shared
        .runtime
        .clone()
        .or_else(|| Handle::try_current().ok())
    else {
        warn!("Not scheduling: no tokio runtime available");
        return;
    };

    cancel_pending(shared);
    shared.generation += 1;
    let generation = shared.generation;

    shared.state.next_retry = chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| Utc::now().checked_add_signed(delay));

    info!(
        "Reconnecting in {:.1}s (attempt {}/{})",
        delay.as_secs_f64(),
        shared.state.retry_count + 1,
        inner.backoff.max_retries()
    );

    let weak = Arc::downgrade(inner);
    let task = runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        run_attempt(weak, generation).await;
    });
    shared.pending = Some(PendingAttempt { generation, task });
}

async fn run_attempt(weak: Weak<Inner>, generation: u64) {
    let (op, attempt, max_retries, timeout) = {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let mut shared = inner.lock();
        if !shared.is_current(generation) {
            debug!("Skipping superseded attempt (generation {})", generation);
            return;
        }
        let Some(op) = shared.reconnect_op.clone() else {
            shared.pending = None;
            shared.state.next_retry = None;
            return;
        };

        shared.state.last_attempt = Some(Utc::now());
        shared.state.retry_count += 1;
        shared.state.next_retry = None;
        (
            op,
            shared.state.retry_count,
            inner.backoff.max_retries(),
            inner.config.timeout(),
        )
    };

    debug!("Reconnect attempt {}/{} started", attempt, max_retries);
    let outcome = race(op, timeout).await;

    if let Some(inner) = weak.upgrade() {
        apply_outcome(&inner, generation, attempt, outcome);
    }
}

/// Run the operation against the attempt timeout. Whichever side loses is
/// dropped, so a late result can never surface.
async fn race(op: ReconnectOp, timeout: Duration) -> Result<(), AttemptFailure> {
    let attempt = AssertUnwindSafe(async move { op().await }).catch_unwind();

    match tokio::time::timeout(timeout, attempt).await {
        Err(_) => Err(AttemptFailure::TimedOut(timeout.as_millis() as u64)),
        Ok(Err(payload)) => Err(AttemptFailure::Panicked(panic_message(payload.as_ref()))),
        Ok(Ok(Ok(true))) => Ok(()),
        Ok(Ok(Ok(false))) => Err(AttemptFailure::Refused),
        Ok(Ok(Err(e))) => Err(AttemptFailure::Failed(e)),
    }
}

fn apply_outcome(
    inner: &Arc<Inner>,
    generation: u64,
    attempt: u32,
    outcome: Result<(), AttemptFailure>,
) {
    let max_retries = inner.backoff.max_retries();

    let transition = {
        let mut shared = inner.lock();
        if !shared.is_current(generation) {
            debug!(
                "Discarding outcome of stale attempt {} (generation {})",
                attempt, generation
            );
            return;
        }
        // This task is the pending one; release it without aborting itself
        shared.pending = None;

        match outcome {
            Ok(()) => {
                info!("Reconnect attempt {}/{} succeeded", attempt, max_retries);
                let was_disconnected = !shared.state.is_connected;
                mark_connected(&mut shared);
                was_disconnected.then(|| shared.next_transition())
            }
            Err(failure) => {
                warn!("Reconnect attempt {}/{} failed: {}", attempt, max_retries, failure);

                if shared.state.retry_count < max_retries {
                    schedule(inner, &mut shared);
                } else {
                    shared.state.next_retry = None;
                    warn!(
                        "Retry budget exhausted after {} attempts, giving up until forced",
                        attempt
                    );
                }
                None
            }
        }
    };

    if let Some(transition) = transition {
        notify(inner, true, transition);
    }
}
