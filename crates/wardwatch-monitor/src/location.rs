//! Fixed-cadence location sampling with geofence-exit alerts.
//!
//! The poller loads the subject's geofence set through an async subscription
//! (each emission replaces the set wholesale), samples the device position on
//! a fixed interval, discards low-accuracy fixes, evaluates containment
//! against the current set, throttles alerts per kind, and persists every
//! accepted sample to the current-position and history targets as independent
//! best-effort writes.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use wardwatch_core::defaults;
use wardwatch_core::{
    geo, AlertKind, Geofence, GeofenceStore, LocationProvider, LocationSample, LocationStore,
    MonitorEvent, MonitorEventBus, NotificationCategory, NotificationRecord, NotificationStore,
};

/// Configuration for the location poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between sampling cycles.
    pub poll_interval: Duration,
    /// Fixes with a reported accuracy radius above this (meters) are
    /// discarded silently.
    pub accuracy_limit_m: f64,
    /// Minimum elapsed time between two alerts of the same kind.
    pub alert_cooldown: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            accuracy_limit_m: defaults::ACCURACY_LIMIT_M,
            alert_cooldown: Duration::from_secs(defaults::ALERT_COOLDOWN_SECS),
        }
    }
}

impl PollerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LOCATION_POLL_INTERVAL_SECS` | `60` | Sampling cadence |
    /// | `LOCATION_ACCURACY_LIMIT_M` | `200` | Accuracy rejection threshold |
    /// | `LOCATION_ALERT_COOLDOWN_SECS` | `300` | Per-kind alert cooldown |
    pub fn from_env() -> Self {
        let poll_interval_secs = std::env::var("LOCATION_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::POLL_INTERVAL_SECS);

        let accuracy_limit_m = std::env::var("LOCATION_ACCURACY_LIMIT_M")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults::ACCURACY_LIMIT_M);

        let alert_cooldown_secs = std::env::var("LOCATION_ALERT_COOLDOWN_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ALERT_COOLDOWN_SECS);

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            accuracy_limit_m,
            alert_cooldown: Duration::from_secs(alert_cooldown_secs),
        }
    }

    /// Set the sampling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the accuracy rejection threshold in meters.
    pub fn with_accuracy_limit(mut self, limit_m: f64) -> Self {
        self.accuracy_limit_m = limit_m;
        self
    }

    /// Set the per-kind alert cooldown.
    pub fn with_alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }
}

/// Per-alert-kind last-fired timestamps.
///
/// Only the poller loop touches these, so no cross-task contention exists.
#[derive(Debug, Default)]
struct ThrottleState {
    last_outside_zone: Option<Instant>,
    last_services_disabled: Option<Instant>,
}

impl ThrottleState {
    /// Whether an alert of this kind may fire now. On true, the kind's
    /// timestamp is reset to now.
    fn allow(&mut self, kind: AlertKind, cooldown: Duration) -> bool {
        let slot = match kind {
            AlertKind::OutsideZone => &mut self.last_outside_zone,
            AlertKind::ServicesDisabled => &mut self.last_services_disabled,
        };
        let now = Instant::now();
        match slot {
            Some(last) if now.duration_since(*last) < cooldown => false,
            _ => {
                *slot = Some(now);
                true
            }
        }
    }
}

/// Identity of the subject/guardian pair a poller serves.
#[derive(Debug, Clone)]
pub struct PollerIdentity {
    pub subject_id: String,
    pub subject_name: String,
    pub guardian_id: String,
}

/// Periodic location sampler for one subject.
pub struct LocationPoller {
    identity: PollerIdentity,
    geofences: Arc<dyn GeofenceStore>,
    locations: Arc<dyn LocationStore>,
    notifications: Arc<dyn NotificationStore>,
    provider: Arc<dyn LocationProvider>,
    events: MonitorEventBus,
    config: PollerConfig,
    zones: Arc<RwLock<Vec<Geofence>>>,
    control: Mutex<Option<PollerControl>>,
}

struct PollerControl {
    shutdown_tx: mpsc::Sender<()>,
    force_tx: mpsc::Sender<()>,
}

impl LocationPoller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: PollerIdentity,
        geofences: Arc<dyn GeofenceStore>,
        locations: Arc<dyn LocationStore>,
        notifications: Arc<dyn NotificationStore>,
        provider: Arc<dyn LocationProvider>,
        events: MonitorEventBus,
        config: PollerConfig,
    ) -> Self {
        Self {
            identity,
            geofences,
            locations,
            notifications,
            provider,
            events,
            config,
            zones: Arc::new(RwLock::new(Vec::new())),
            control: Mutex::new(None),
        }
    }

    /// Start polling: subscribe to the geofence set, sample once immediately,
    /// then repeat on the fixed interval until [`stop`](Self::stop).
    /// Idempotent while running.
    pub async fn start(self: &Arc<Self>) {
        let mut control = self.control.lock().await;
        if control.is_some() {
            debug!(subject_id = %self.identity.subject_id, "Location poller already running");
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let (force_tx, mut force_rx) = mpsc::channel(4);
        *control = Some(PollerControl {
            shutdown_tx,
            force_tx,
        });

        let poller = self.clone();
        tokio::spawn(async move {
            info!(
                subject_id = %poller.identity.subject_id,
                poll_interval_secs = poller.config.poll_interval.as_secs(),
                "Location poller started"
            );
            poller.run(&mut shutdown_rx, &mut force_rx).await;
            info!(subject_id = %poller.identity.subject_id, "Location poller stopped");
        });
    }

    /// Cancel the interval timer and the geofence subscription. Idempotent.
    pub async fn stop(&self) {
        if let Some(control) = self.control.lock().await.take() {
            let _ = control.shutdown_tx.send(()).await;
        }
    }

    /// Trigger one immediate sampling cycle outside the regular schedule.
    /// No-op when the poller is not running.
    pub async fn force_update(&self) {
        if let Some(control) = self.control.lock().await.as_ref() {
            let _ = control.force_tx.send(()).await;
        }
    }

    /// Current geofence set (latest subscription emission).
    pub async fn zone_count(&self) -> usize {
        self.zones.read().await.len()
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>, force_rx: &mut mpsc::Receiver<()>) {
        let mut zone_stream = self.subscribe_zones().await;
        let mut throttle = ThrottleState::default();

        let mut interval = tokio::time::interval(self.config.poll_interval);
        // The first interval tick fires immediately: one sample before the
        // regular cadence begins.
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                update = zone_stream.next() => match update {
                    Some(set) => {
                        debug!(
                            subject_id = %self.identity.subject_id,
                            zone_count = set.len(),
                            "Geofence set replaced"
                        );
                        *self.zones.write().await = set;
                    }
                    None => {
                        warn!(subject_id = %self.identity.subject_id, "Geofence subscription ended");
                        zone_stream = futures::stream::pending().boxed();
                    }
                },
                _ = force_rx.recv() => self.sample_cycle(&mut throttle).await,
                _ = interval.tick() => self.sample_cycle(&mut throttle).await,
            }
        }
    }

    async fn subscribe_zones(&self) -> BoxStream<'static, Vec<Geofence>> {
        match self.geofences.subscribe(&self.identity.subject_id).await {
            Ok(stream) => stream,
            Err(e) => {
                // Polling proceeds with an empty set (treated as "inside").
                error!(
                    subject_id = %self.identity.subject_id,
                    error = %e,
                    "Geofence subscription failed"
                );
                futures::stream::pending().boxed()
            }
        }
    }

    /// One sampling cycle: services check, fix, accuracy filter, containment,
    /// throttled alert, then best-effort persistence. Each step is isolated
    /// so one failure never blocks the next step.
    async fn sample_cycle(&self, throttle: &mut ThrottleState) {
        if !self.provider.services_enabled().await {
            self.alert_services_disabled(throttle).await;
            return;
        }

        let fix = match self.provider.current_fix().await {
            Ok(fix) => fix,
            Err(e) => {
                warn!(
                    subject_id = %self.identity.subject_id,
                    error = %e,
                    "Location fix request failed"
                );
                // Same throttled alert kind when the failure is confirmed to
                // be disabled services, not a separate one.
                if !self.provider.services_enabled().await {
                    self.alert_services_disabled(throttle).await;
                }
                return;
            }
        };

        if fix.accuracy_m > self.config.accuracy_limit_m {
            debug!(
                subject_id = %self.identity.subject_id,
                accuracy_m = fix.accuracy_m,
                "Discarding low-accuracy fix"
            );
            return;
        }

        let zones = self.zones.read().await.clone();
        if geo::is_outside_all(fix.point, &zones)
            && throttle.allow(AlertKind::OutsideZone, self.config.alert_cooldown)
        {
            self.alert_outside_zone(fix.point.lat, fix.point.lng).await;
        }

        let sample = LocationSample::from_fix(&self.identity.subject_id, &fix);
        if let Err(e) = self
            .locations
            .write_current(&self.identity.subject_id, &sample)
            .await
        {
            error!(
                subject_id = %self.identity.subject_id,
                error = %e,
                "Failed to write current location"
            );
        }
        // History append is attempted even when the current write failed.
        if let Err(e) = self
            .locations
            .append_history(&self.identity.subject_id, &sample)
            .await
        {
            error!(
                subject_id = %self.identity.subject_id,
                error = %e,
                "Failed to append location history"
            );
        }
    }

    async fn alert_services_disabled(&self, throttle: &mut ThrottleState) {
        if !throttle.allow(AlertKind::ServicesDisabled, self.config.alert_cooldown) {
            return;
        }
        let record = NotificationRecord {
            id: Uuid::new_v4().to_string(),
            category: NotificationCategory::System,
            title: "Location services disabled".to_string(),
            message: "Please enable location services so check-ins keep working.".to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            read: false,
            clicked: false,
        };
        if let Err(e) = self
            .notifications
            .send(&self.identity.subject_id, record)
            .await
        {
            error!(
                subject_id = %self.identity.subject_id,
                error = %e,
                "Failed to send services-disabled alert"
            );
        }
        self.events.emit(MonitorEvent::alert(
            self.identity.subject_id.as_str(),
            AlertKind::ServicesDisabled,
        ));
    }

    async fn alert_outside_zone(&self, lat: f64, lng: f64) {
        info!(
            subject_id = %self.identity.subject_id,
            guardian_id = %self.identity.guardian_id,
            lat,
            lng,
            "Subject outside all zones, alerting guardian"
        );
        let record = NotificationRecord {
            id: Uuid::new_v4().to_string(),
            category: NotificationCategory::System,
            title: format!("{} left the safe zones", self.identity.subject_name),
            message: format!("Last known position: {lat:.5}, {lng:.5}"),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            read: false,
            clicked: false,
        };
        if let Err(e) = self
            .notifications
            .send(&self.identity.guardian_id, record)
            .await
        {
            error!(
                guardian_id = %self.identity.guardian_id,
                error = %e,
                "Failed to send outside-zone alert"
            );
        }
        self.events.emit(MonitorEvent::alert(
            self.identity.subject_id.as_str(),
            AlertKind::OutsideZone,
        ));
    }
}
