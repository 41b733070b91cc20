//! Tether daemon
//!
//! Watches a health endpoint, drives a reconnect manager from the probe
//! results and logs connectivity transitions.

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use tether::config::env::get_config_path;
use tether::config::load_and_validate;
use tether::{HealthProbe, NetworkMonitor, ProbeSignalSource, ReconnectManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Tether v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Probe: {}", config.probe.url);
    info!(
        "  Retries: {} (base {}ms, max {}ms, x{}, timeout {}ms)",
        config.reconnect.max_retries,
        config.reconnect.base_delay_ms,
        config.reconnect.max_delay_ms,
        config.reconnect.backoff_multiplier,
        config.reconnect.timeout_ms
    );

    // ============================================================
    // Composition root: one manager, shared by handle
    // ============================================================
    let manager = ReconnectManager::new(config.reconnect.clone())?;
    if let Some(ref session) = config.session {
        manager.set_session(session.session_id.clone(), session.player_id.clone());
    }

    let probe = HealthProbe::new(&config.probe)?;

    // Reconnecting here means the health endpoint answers again
    let reconnect_probe = probe.clone();
    manager.set_reconnect_callback(move || {
        let probe = reconnect_probe.clone();
        async move { anyhow::Ok(probe.check().await) }
    });

    let subscription = manager.on_connection_change(|connected| {
        if connected {
            info!("Connectivity: online");
        } else {
            warn!("Connectivity: offline");
        }
    });

    // ============================================================
    // Signals: probe polling -> monitor -> manager
    // ============================================================
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let (poll_task, online_rx) =
        ProbeSignalSource::new(probe.clone(), config.probe.interval()).spawn(signal_tx);

    let monitor = NetworkMonitor::new(manager.clone(), probe).with_environment(Arc::new(online_rx));
    monitor.attach(signal_rx);

    if monitor.check_connection().await {
        info!("Health endpoint reachable");
    } else {
        warn!("Health endpoint not reachable yet");
    }

    shutdown_signal().await;
    info!("Shutdown signal received - stopping...");

    poll_task.abort();
    monitor.detach();
    subscription.unsubscribe();

    match serde_json::to_string(&manager.get_state()) {
        Ok(state) => info!("Final state: {}", state),
        Err(e) => warn!("Failed to serialize final state: {}", e),
    }
    manager.reset();

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
