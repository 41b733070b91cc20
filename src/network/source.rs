//! Probe-driven connectivity signals.
//!
//! For hosts with no native online/offline events: polls a [`HealthProbe`]
//! and emits [`NetworkSignal`]s when the result flips.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::common::types::NetworkSignal;
use crate::network::probe::HealthProbe;

pub struct ProbeSignalSource {
    probe: HealthProbe,
    interval: Duration,
}

impl ProbeSignalSource {
    pub fn new(probe: HealthProbe, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Start polling. Returns the polling task and a status receiver that
    /// doubles as the monitor's [`Environment`](super::Environment).
    ///
    /// The task ends once the signal receiver is dropped.
    pub fn spawn(
        self,
        signals: mpsc::UnboundedSender<NetworkSignal>,
    ) -> (JoinHandle<()>, watch::Receiver<Option<bool>>) {
        let (status_tx, status_rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let online = self.probe.check().await;
                let previous = status_tx.send_replace(Some(online));
                if previous == Some(online) {
                    continue;
                }

                debug!("Probe {} now reports online={}", self.probe.url(), online);
                let signal = if online {
                    NetworkSignal::Online
                } else {
                    NetworkSignal::Offline
                };
                if signals.send(signal).is_err() {
                    info!("Signal receiver closed, stopping probe polling");
                    break;
                }
            }
        });

        (task, status_rx)
    }
}
