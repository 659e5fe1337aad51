//! Connectivity supervision: the root orchestrator of the monitoring host.
//!
//! A three-state machine over {Unknown, Available, Unavailable} driven by
//! default-network callback events. Entering Available starts the location
//! poller and the notification monitor; entering Unavailable stops them.
//! Duplicate events reporting the same effective state are ignored, so
//! already-running monitors are never restarted.
//!
//! Failures inside the event handler never propagate outward; the ongoing
//! status message is the only user-facing surface for connectivity and
//! permission problems.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use wardwatch_core::defaults;
use wardwatch_core::{
    ConnectivityState, MonitorDisplay, MonitorEvent, MonitorEventBus, NetworkCapabilities,
    NetworkEvent, NetworkWatcher,
};

use crate::location::LocationPoller;
use crate::notify::NotificationMonitor;

/// Orchestrates monitor lifecycles from network availability transitions.
pub struct ConnectivitySupervisor {
    watcher: Arc<dyn NetworkWatcher>,
    poller: Arc<LocationPoller>,
    monitor: Arc<NotificationMonitor>,
    display: Arc<dyn MonitorDisplay>,
    events: MonitorEventBus,
    state: Arc<Mutex<ConnectivityState>>,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl ConnectivitySupervisor {
    pub fn new(
        watcher: Arc<dyn NetworkWatcher>,
        poller: Arc<LocationPoller>,
        monitor: Arc<NotificationMonitor>,
        display: Arc<dyn MonitorDisplay>,
        events: MonitorEventBus,
    ) -> Self {
        Self {
            watcher,
            poller,
            monitor,
            display,
            events,
            state: Arc::new(Mutex::new(ConnectivityState::Unknown)),
            shutdown: Mutex::new(None),
        }
    }

    /// Current connectivity state.
    pub async fn state(&self) -> ConnectivityState {
        *self.state.lock().await
    }

    /// Register the network callback and begin supervising.
    ///
    /// The active network's capabilities are evaluated synchronously to seed
    /// the state before any callback fires. If registration is denied, a
    /// permission-error status is reported and the monitors stay stopped;
    /// there is no automatic retry.
    pub async fn start(self: &Arc<Self>) {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            debug!("Connectivity supervisor already running");
            return;
        }

        let (seed, event_stream) = match self.watcher.watch().await {
            Ok(watch) => watch,
            Err(e) => {
                error!(error = %e, "Failed to register network callback");
                self.set_status(defaults::STATUS_NETWORK_PERMISSION).await;
                return;
            }
        };

        let (tx, mut rx) = mpsc::channel(1);
        *shutdown = Some(tx);
        drop(shutdown);

        self.apply_seed(seed).await;

        let supervisor = self.clone();
        tokio::spawn(async move {
            info!("Connectivity supervisor started");
            let mut events = event_stream;
            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    event = events.next() => match event {
                        Some(event) => supervisor.handle_event(event).await,
                        None => {
                            debug!("Network event stream ended");
                            break;
                        }
                    },
                }
            }
            info!("Connectivity supervisor stopped");
        });
    }

    /// Stop supervising and shut down both monitors. Idempotent.
    ///
    /// The state returns to Unknown so a later [`start`](Self::start) seeds
    /// fresh: a stale Available would otherwise be swallowed by the
    /// transition guard and the monitors would never resume.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }
        self.poller.stop().await;
        self.monitor.stop().await;
        *self.state.lock().await = ConnectivityState::Unknown;
    }

    /// Seed the state machine from the synchronously-evaluated active
    /// network, before any callback event arrives.
    async fn apply_seed(&self, seed: Option<NetworkCapabilities>) {
        match seed {
            Some(caps) if caps.is_usable() => {
                self.transition(
                    ConnectivityState::Available,
                    defaults::STATUS_MONITORING_ACTIVE,
                )
                .await;
            }
            Some(_) => {
                self.transition(
                    ConnectivityState::Unavailable,
                    defaults::STATUS_NETWORK_ISSUE,
                )
                .await;
            }
            None => {
                self.transition(
                    ConnectivityState::Unavailable,
                    defaults::STATUS_WAITING_FOR_NETWORK,
                )
                .await;
            }
        }
    }

    async fn handle_event(&self, event: NetworkEvent) {
        match event {
            NetworkEvent::Available(caps) | NetworkEvent::CapabilitiesChanged(caps) => {
                if caps.is_usable() {
                    self.transition(
                        ConnectivityState::Available,
                        defaults::STATUS_MONITORING_ACTIVE,
                    )
                    .await;
                } else {
                    self.transition(
                        ConnectivityState::Unavailable,
                        defaults::STATUS_NETWORK_ISSUE,
                    )
                    .await;
                }
            }
            NetworkEvent::Lost => {
                self.transition(
                    ConnectivityState::Unavailable,
                    defaults::STATUS_NETWORK_ISSUE,
                )
                .await;
            }
            NetworkEvent::Unavailable => {
                self.transition(
                    ConnectivityState::Unavailable,
                    defaults::STATUS_WAITING_FOR_NETWORK,
                )
                .await;
            }
        }
    }

    /// Apply a state transition, starting or stopping the monitors only on
    /// an actual change. Repeated events of the same effective state are
    /// no-ops.
    async fn transition(&self, to: ConnectivityState, status: &str) {
        let from = {
            let mut state = self.state.lock().await;
            let from = *state;
            if from == to {
                debug!(?to, "Connectivity state unchanged, ignoring");
                return;
            }
            *state = to;
            from
        };

        info!(?from, ?to, "Connectivity state changed");
        self.events
            .emit(MonitorEvent::ConnectivityChanged { from, to });

        match to {
            ConnectivityState::Available => {
                self.poller.start().await;
                self.monitor.start().await;
                self.events.emit(MonitorEvent::MonitorsStarted);
            }
            ConnectivityState::Unavailable => {
                self.poller.stop().await;
                self.monitor.stop().await;
                self.events.emit(MonitorEvent::MonitorsStopped);
            }
            ConnectivityState::Unknown => {}
        }
        self.set_status(status).await;
    }

    async fn set_status(&self, message: &str) {
        self.display.update_ongoing_status(message).await;
        self.events.emit(MonitorEvent::StatusChanged {
            message: message.to_string(),
        });
    }
}
