//! Shared in-memory mock collaborators for the monitor integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

use wardwatch_core::{
    Error, Geofence, GeofenceStore, GeofencingEngine, LocationFix, LocationProvider,
    LocationSample, LocationStore, MonitorDisplay, NetworkCapabilities, NetworkEvent,
    NetworkWatcher, NotificationRecord, NotificationStore, PresentedNotification, RegionRequest,
    ReminderAlarm, Result,
};

static TRACING: Once = Once::new();

/// Install a test subscriber once per process (RUST_LOG controls verbosity).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Poll a condition until it holds, panicking after ~2 seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s: {what}");
}

/// Async variant of [`eventually`] for conditions behind async locks.
pub async fn eventually_async<F, Fut>(what: &str, condition: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s: {what}");
}

fn channel_stream<T: Send + 'static>(rx: mpsc::UnboundedReceiver<T>) -> BoxStream<'static, T> {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

// =============================================================================
// GEOFENCE STORE
// =============================================================================

#[derive(Default)]
pub struct MockGeofenceStore {
    senders: Mutex<Vec<mpsc::UnboundedSender<Vec<Geofence>>>>,
    pub fail_subscribe: AtomicBool,
}

impl MockGeofenceStore {
    /// Push a zone-set emission to every live subscription.
    pub fn emit(&self, zones: Vec<Geofence>) {
        for tx in self.senders.lock().unwrap().iter() {
            let _ = tx.send(zones.clone());
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.senders.lock().unwrap().len()
    }
}

#[async_trait]
impl GeofenceStore for MockGeofenceStore {
    async fn subscribe(&self, _subject_id: &str) -> Result<BoxStream<'static, Vec<Geofence>>> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Error::Store("subscribe rejected".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(channel_stream(rx))
    }
}

// =============================================================================
// LOCATION STORE
// =============================================================================

#[derive(Default)]
pub struct MockLocationStore {
    pub current: Mutex<Vec<LocationSample>>,
    pub history: Mutex<Vec<LocationSample>>,
    pub fail_current: AtomicBool,
}

impl MockLocationStore {
    pub fn current_count(&self) -> usize {
        self.current.lock().unwrap().len()
    }

    pub fn history_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

#[async_trait]
impl LocationStore for MockLocationStore {
    async fn write_current(&self, _subject_id: &str, sample: &LocationSample) -> Result<()> {
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(Error::Store("current write rejected".into()));
        }
        self.current.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn append_history(&self, _subject_id: &str, sample: &LocationSample) -> Result<()> {
        self.history.lock().unwrap().push(sample.clone());
        Ok(())
    }
}

// =============================================================================
// NOTIFICATION STORE
// =============================================================================

#[derive(Default)]
pub struct MockNotificationStore {
    senders: Mutex<Vec<mpsc::UnboundedSender<Result<Vec<NotificationRecord>>>>>,
    pub marked_read: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(String, NotificationRecord)>>,
    pub fail_subscribe: AtomicBool,
}

impl MockNotificationStore {
    /// Push a feed emission to every live subscription.
    pub fn emit(&self, records: Vec<NotificationRecord>) {
        for tx in self.senders.lock().unwrap().iter() {
            let _ = tx.send(Ok(records.clone()));
        }
    }

    /// Push a subscription error to every live subscription.
    pub fn emit_error(&self, message: &str) {
        for tx in self.senders.lock().unwrap().iter() {
            let _ = tx.send(Err(Error::Subscription(message.into())));
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<NotificationRecord> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MockNotificationStore {
    async fn subscribe(
        &self,
        _subject_id: &str,
    ) -> Result<BoxStream<'static, Result<Vec<NotificationRecord>>>> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Error::Store("subscribe rejected".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(channel_stream(rx))
    }

    async fn mark_read(&self, _subject_id: &str, id: &str) -> Result<()> {
        self.marked_read.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn send(&self, user_id: &str, record: NotificationRecord) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), record));
        Ok(())
    }
}

// =============================================================================
// LOCATION PROVIDER
// =============================================================================

pub struct MockLocationProvider {
    pub services_on: AtomicBool,
    /// Next fix handed out by `current_fix`; None makes the request fail.
    pub next_fix: Mutex<Option<LocationFix>>,
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self {
            services_on: AtomicBool::new(true),
            next_fix: Mutex::new(None),
        }
    }
}

impl MockLocationProvider {
    pub fn set_fix(&self, fix: LocationFix) {
        *self.next_fix.lock().unwrap() = Some(fix);
    }

    pub fn set_services(&self, enabled: bool) {
        self.services_on.store(enabled, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn services_enabled(&self) -> bool {
        self.services_on.load(Ordering::SeqCst)
    }

    async fn current_fix(&self) -> Result<LocationFix> {
        let next = *self.next_fix.lock().unwrap();
        next.ok_or_else(|| Error::Provider("no fix available".into()))
    }
}

// =============================================================================
// GEOFENCING ENGINE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    Clear(String),
    Register(RegionRequest),
}

#[derive(Default)]
pub struct MockGeofencingEngine {
    pub ops: Mutex<Vec<EngineOp>>,
}

impl MockGeofencingEngine {
    pub fn ops_snapshot(&self) -> Vec<EngineOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn registered_ids(&self) -> Vec<String> {
        self.ops_snapshot()
            .into_iter()
            .filter_map(|op| match op {
                EngineOp::Register(request) => Some(request.region_id),
                EngineOp::Clear(_) => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.ops_snapshot()
            .iter()
            .filter(|op| matches!(op, EngineOp::Clear(_)))
            .count()
    }
}

#[async_trait]
impl GeofencingEngine for MockGeofencingEngine {
    async fn register(&self, request: RegionRequest) -> Result<()> {
        self.ops.lock().unwrap().push(EngineOp::Register(request));
        Ok(())
    }

    async fn clear_all(&self, request_identity: &str) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(EngineOp::Clear(request_identity.to_string()));
        Ok(())
    }
}

// =============================================================================
// ALARM BACKEND
// =============================================================================

pub struct MockAlarmBackend {
    pub exact_allowed: AtomicBool,
    pub scheduled: Mutex<HashMap<i32, ReminderAlarm>>,
}

impl Default for MockAlarmBackend {
    fn default() -> Self {
        Self {
            exact_allowed: AtomicBool::new(true),
            scheduled: Mutex::new(HashMap::new()),
        }
    }
}

impl MockAlarmBackend {
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }

    pub fn alarm_for(&self, request_code: i32) -> Option<ReminderAlarm> {
        self.scheduled.lock().unwrap().get(&request_code).cloned()
    }
}

impl wardwatch_core::AlarmBackend for MockAlarmBackend {
    fn can_schedule_exact(&self) -> bool {
        self.exact_allowed.load(Ordering::SeqCst)
    }

    fn schedule_exact(&self, request_code: i32, alarm: ReminderAlarm) -> Result<()> {
        self.scheduled.lock().unwrap().insert(request_code, alarm);
        Ok(())
    }

    fn cancel_existing(&self, request_code: i32) -> bool {
        self.scheduled
            .lock()
            .unwrap()
            .remove(&request_code)
            .is_some()
    }
}

// =============================================================================
// NETWORK WATCHER
// =============================================================================

#[derive(Default)]
pub struct MockNetworkWatcher {
    pub seed: Mutex<Option<NetworkCapabilities>>,
    pub deny_permission: AtomicBool,
    senders: Mutex<Vec<mpsc::UnboundedSender<NetworkEvent>>>,
}

impl MockNetworkWatcher {
    pub fn with_seed(seed: Option<NetworkCapabilities>) -> Self {
        Self {
            seed: Mutex::new(seed),
            ..Default::default()
        }
    }

    pub fn emit(&self, event: NetworkEvent) {
        for tx in self.senders.lock().unwrap().iter() {
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl NetworkWatcher for MockNetworkWatcher {
    async fn watch(
        &self,
    ) -> Result<(Option<NetworkCapabilities>, BoxStream<'static, NetworkEvent>)> {
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(Error::PermissionDenied("network callback".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok((*self.seed.lock().unwrap(), channel_stream(rx)))
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

#[derive(Default)]
pub struct MockDisplay {
    pub shown: Mutex<Vec<PresentedNotification>>,
    pub statuses: Mutex<Vec<String>>,
}

impl MockDisplay {
    pub fn shown_ids(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.record.id.clone())
            .collect()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MonitorDisplay for MockDisplay {
    async fn show_notification(&self, presented: &PresentedNotification) {
        self.shown.lock().unwrap().push(presented.clone());
    }

    async fn update_ongoing_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}

// =============================================================================
// FIXTURE HELPERS
// =============================================================================

pub fn zone(id: &str, name: &str, lat: f64, lng: f64, radius_m: f64) -> Geofence {
    Geofence {
        id: id.into(),
        name: name.into(),
        center: wardwatch_core::GeoPoint::new(lat, lng),
        radius_m,
    }
}

pub fn notification(
    id: &str,
    category: wardwatch_core::NotificationCategory,
    read: bool,
) -> NotificationRecord {
    NotificationRecord {
        id: id.into(),
        category,
        title: format!("title-{id}"),
        message: format!("message-{id}"),
        timestamp_ms: 1_700_000_000_000,
        read,
        clicked: false,
    }
}

pub fn fix(lat: f64, lng: f64, accuracy_m: f64) -> LocationFix {
    LocationFix {
        point: wardwatch_core::GeoPoint::new(lat, lng),
        accuracy_m,
    }
}
