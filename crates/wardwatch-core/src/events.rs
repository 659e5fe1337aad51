//! Monitor event types and event bus for lifecycle observability.
//!
//! The monitoring components publish lifecycle and alert events onto a single
//! broadcast channel. Downstream consumers (the host UI, diagnostics,
//! telemetry) subscribe independently; a lagging receiver drops the oldest
//! events rather than blocking emitters.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{AlertKind, ConnectivityState};

/// Event emitted by the monitoring components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// The connectivity supervisor changed state.
    ConnectivityChanged {
        from: ConnectivityState,
        to: ConnectivityState,
    },
    /// The location poller and notification monitor were started.
    MonitorsStarted,
    /// The location poller and notification monitor were stopped.
    MonitorsStopped,
    /// The ongoing status indicator text changed.
    StatusChanged { message: String },
    /// A throttled alert was sent (cooldown elapsed).
    AlertSent { subject_id: String, kind_label: String },
    /// A notification was displayed from the delivery queue.
    NotificationDisplayed { notification_id: String, urgent: bool },
}

impl MonitorEvent {
    /// Build an alert event with the canonical label for the kind.
    pub fn alert(subject_id: impl Into<String>, kind: AlertKind) -> Self {
        let kind_label = match kind {
            AlertKind::OutsideZone => "outside_zone",
            AlertKind::ServicesDisabled => "services_disabled",
        };
        MonitorEvent::AlertSent {
            subject_id: subject_id.into(),
            kind_label: kind_label.to_string(),
        }
    }
}

/// Broadcast bus for [`MonitorEvent`]s.
#[derive(Clone)]
pub struct MonitorEventBus {
    tx: broadcast::Sender<MonitorEvent>,
}

impl MonitorEventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: [`crate::defaults::EVENT_BUS_CAPACITY`] for production,
    /// 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. If there are no active subscribers,
    /// the event is silently dropped.
    pub fn emit(&self, event: MonitorEvent) {
        tracing::debug!(
            subscriber_count = self.tx.receiver_count(),
            ?event,
            "MonitorEventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events. Each subscriber gets its own independent
    /// stream.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MonitorEventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
