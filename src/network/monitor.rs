//! Translates environment connectivity signals into manager calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::common::types::NetworkSignal;
use crate::network::probe::HealthProbe;
use crate::reconnect::ReconnectManager;

/// A platform that can report whether it believes it is online.
pub trait Environment: Send + Sync {
    /// `None` when the platform cannot tell.
    fn is_online(&self) -> Option<bool>;
}

/// A watch channel fed by some status source acts as an environment.
impl Environment for watch::Receiver<Option<bool>> {
    fn is_online(&self) -> Option<bool> {
        *self.borrow()
    }
}

/// Signal adapter sitting between the host environment and a
/// [`ReconnectManager`].
///
/// Holds a manager handle but does not own its state.
pub struct NetworkMonitor {
    manager: ReconnectManager,
    environment: Option<Arc<dyn Environment>>,
    probe: HealthProbe,
    last_known_online: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkMonitor {
    /// Monitor with no environment: assumes online and never wires signals.
    pub fn new(manager: ReconnectManager, probe: HealthProbe) -> Self {
        Self {
            manager,
            environment: None,
            probe,
            last_known_online: Arc::new(AtomicBool::new(true)),
            task: Mutex::new(None),
        }
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        let online = environment.is_online().unwrap_or(true);
        self.last_known_online.store(online, Ordering::SeqCst);
        self.environment = Some(environment);
        self
    }

    /// Start consuming `signals`. Replaces any previously attached stream.
    ///
    /// Returns `false` (and drops the receiver) when there is no environment
    /// to take signals from.
    pub fn attach(&self, mut signals: mpsc::UnboundedReceiver<NetworkSignal>) -> bool {
        if self.environment.is_none() {
            debug!("No connectivity environment, skipping signal wiring");
            return false;
        }

        let manager = self.manager.clone();
        let last_known_online = self.last_known_online.clone();
        let task = tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                dispatch(&manager, &last_known_online, signal);
            }
            debug!("Network signal stream closed");
        });

        if let Some(previous) = self.lock_task().replace(task) {
            previous.abort();
        }
        true
    }

    /// Stop consuming signals.
    pub fn detach(&self) {
        if let Some(task) = self.lock_task().take() {
            task.abort();
        }
    }

    /// Apply one signal immediately, bypassing the attached stream.
    pub fn handle_signal(&self, signal: NetworkSignal) {
        dispatch(&self.manager, &self.last_known_online, signal);
    }

    /// Best-known environment status; `true` when it cannot be determined.
    pub fn is_browser_online(&self) -> bool {
        self.environment
            .as_ref()
            .and_then(|environment| environment.is_online())
            .unwrap_or(true)
    }

    /// One-shot liveness check. Does not touch the manager.
    pub async fn check_connection(&self) -> bool {
        self.probe.check().await
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}

fn dispatch(manager: &ReconnectManager, last_known_online: &AtomicBool, signal: NetworkSignal) {
    match signal {
        NetworkSignal::Online => {
            info!("Network online");
            last_known_online.store(true, Ordering::SeqCst);
            manager.handle_reconnection();
        }
        NetworkSignal::Offline => {
            info!("Network offline");
            last_known_online.store(false, Ordering::SeqCst);
            manager.handle_disconnection();
        }
        NetworkSignal::Visible => {
            if !last_known_online.load(Ordering::SeqCst) {
                info!("Visible again while offline, forcing reconnect");
                manager.force_reconnect();
            }
        }
        NetworkSignal::Hidden => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::common::types::ConnectionPhase;
    use crate::config::types::{ProbeConfig, ReconnectConfig};
    use crate::network::probe::tests::{probe_for, refused_url, serve_once};

    fn make_manager() -> ReconnectManager {
        let manager = ReconnectManager::new(ReconnectConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            backoff_multiplier: 2.0,
            timeout_ms: 500,
        })
        .unwrap();
        manager.set_reconnect_callback(|| async { Ok::<bool, anyhow::Error>(false) });
        manager
    }

    fn unused_probe() -> HealthProbe {
        HealthProbe::new(&ProbeConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_environment_assumes_online_and_skips_wiring() {
        let manager = make_manager();
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe());
        assert!(monitor.is_browser_online());

        let (tx, rx) = mpsc::unbounded_channel();
        assert!(!monitor.attach(rx));

        // Signals go nowhere
        let _ = tx.send(NetworkSignal::Offline);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(manager.get_state().is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_environment_status_reported() {
        let (status_tx, status_rx) = watch::channel::<Option<bool>>(None);
        let monitor = NetworkMonitor::new(make_manager(), unused_probe())
            .with_environment(Arc::new(status_rx));

        // Unknown status reads as online
        assert!(monitor.is_browser_online());

        status_tx.send_replace(Some(false));
        assert!(!monitor.is_browser_online());

        status_tx.send_replace(Some(true));
        assert!(monitor.is_browser_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attached_signals_drive_manager() {
        let manager = make_manager();
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        manager.on_connection_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (_status_tx, status_rx) = watch::channel::<Option<bool>>(Some(true));
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe())
            .with_environment(Arc::new(status_rx));
        let (tx, rx) = mpsc::unbounded_channel();
        assert!(monitor.attach(rx));

        tx.send(NetworkSignal::Offline).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!manager.get_state().is_connected);
        assert!(manager.is_reconnecting());

        tx.send(NetworkSignal::Online).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(manager.get_state().is_connected);
        assert_eq!(notifications.load(Ordering::SeqCst), 2);

        monitor.detach();
        let _ = tx.send(NetworkSignal::Offline);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(manager.get_state().is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reattach_replaces_previous_stream() {
        let manager = make_manager();
        let (_status_tx, status_rx) = watch::channel::<Option<bool>>(Some(true));
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe())
            .with_environment(Arc::new(status_rx));

        let (old_tx, old_rx) = mpsc::unbounded_channel();
        let (new_tx, new_rx) = mpsc::unbounded_channel();
        assert!(monitor.attach(old_rx));
        assert!(monitor.attach(new_rx));

        let _ = old_tx.send(NetworkSignal::Offline);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(manager.get_state().is_connected);

        new_tx.send(NetworkSignal::Offline).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!manager.get_state().is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_monitor_stops_signal_task() {
        let manager = make_manager();
        let (_status_tx, status_rx) = watch::channel::<Option<bool>>(Some(true));
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe())
            .with_environment(Arc::new(status_rx));
        let (tx, rx) = mpsc::unbounded_channel();
        assert!(monitor.attach(rx));

        drop(monitor);
        let _ = tx.send(NetworkSignal::Offline);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(manager.get_state().is_connected);
        assert_eq!(manager.phase(), ConnectionPhase::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_while_offline_forces_reconnect() {
        let manager = make_manager();
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe());

        monitor.handle_signal(NetworkSignal::Offline);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(manager.phase(), ConnectionPhase::Stopped);
        assert_eq!(manager.get_state().retry_count, 3);

        monitor.handle_signal(NetworkSignal::Hidden);
        assert_eq!(manager.phase(), ConnectionPhase::Stopped);

        monitor.handle_signal(NetworkSignal::Visible);
        assert_eq!(manager.phase(), ConnectionPhase::Scheduling);
        assert_eq!(manager.get_state().retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_while_online_does_nothing() {
        let manager = make_manager();
        let monitor = NetworkMonitor::new(manager.clone(), unused_probe());

        monitor.handle_signal(NetworkSignal::Visible);

        assert_eq!(manager.phase(), ConnectionPhase::Connected);
        assert!(!manager.is_reconnecting());
    }

    #[tokio::test]
    async fn test_check_connection_independent_of_manager() {
        let manager = make_manager();

        let monitor = NetworkMonitor::new(manager.clone(), probe_for(serve_once("200 OK").await));
        assert!(monitor.check_connection().await);

        let monitor = NetworkMonitor::new(manager.clone(), probe_for(refused_url().await));
        assert!(!monitor.check_connection().await);

        assert!(manager.get_state().is_connected);
        assert!(!manager.is_reconnecting());
    }
}
