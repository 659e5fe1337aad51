//! Domain model for the wardwatch monitoring system.
//!
//! These are the value types exchanged between the monitoring components and
//! the external stores. Remote persistence formats belong to the stores; the
//! serde derives here exist for transport and diagnostics, not for a wire
//! contract owned by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONNECTIVITY
// =============================================================================

/// Connectivity state owned by the Connectivity Supervisor.
///
/// Transitions happen only on network watcher events and drive the lifecycle
/// of the location poller and notification monitor. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    Unknown,
    Available,
    Unavailable,
}

/// Capability flags reported for the active default network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkCapabilities {
    /// The network claims general internet access.
    pub has_internet: bool,
    /// The platform has validated that the network actually reaches the
    /// internet (captive portals fail this).
    pub validated: bool,
}

impl NetworkCapabilities {
    /// A network is usable only when it both claims and validates internet
    /// access.
    pub fn is_usable(&self) -> bool {
        self.has_internet && self.validated
    }
}

/// Default-network callback events delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A default network became available with the given capabilities.
    Available(NetworkCapabilities),
    /// The active default network's capabilities changed.
    CapabilitiesChanged(NetworkCapabilities),
    /// The active default network was lost.
    Lost,
    /// The platform cannot satisfy the default-network request.
    Unavailable,
}

// =============================================================================
// GEOFENCES & LOCATION
// =============================================================================

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named circular zone used for containment checks.
///
/// Immutable value received from the geofence subscription. The in-memory
/// set held by the location poller is replaced wholesale on every emission,
/// never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    pub radius_m: f64,
}

/// An accuracy-tagged position delivered by the platform location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub point: GeoPoint,
    /// Reported accuracy radius in meters (lower is better).
    pub accuracy_m: f64,
}

/// A persisted position sample for a subject.
///
/// Written to two targets: "current" (overwritten each cycle) and "history"
/// (append-only, never pruned by this subsystem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub subject_id: String,
    pub point: GeoPoint,
    pub accuracy_m: f64,
    pub captured_at_ms: i64,
}

impl LocationSample {
    /// Build a sample from a fix, stamped with the current wall clock.
    pub fn from_fix(subject_id: impl Into<String>, fix: &LocationFix) -> Self {
        Self {
            subject_id: subject_id.into(),
            point: fix.point,
            accuracy_m: fix.accuracy_m,
            captured_at_ms: Utc::now().timestamp_millis(),
        }
    }
}

/// A circular region registration request for the platform geofencing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRequest {
    /// Composite identity: zone name + guardian id + subject name. Stable,
    /// so re-registration replaces the prior region.
    pub region_id: String,
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl RegionRequest {
    /// Build the composite region identity used with the platform engine.
    pub fn region_id_for(zone_name: &str, guardian_id: &str, subject_name: &str) -> String {
        format!("{zone_name}|{guardian_id}|{subject_name}")
    }
}

/// Alert kinds throttled by the location poller's per-kind cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// Subject is outside every zone in the current geofence set.
    OutsideZone,
    /// Platform location services are disabled on the device.
    ServicesDisabled,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Classification of a notification record.
///
/// Urgent categories jump the delivery queue and use a higher-priority
/// presentation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    TaskChange,
    Reward,
    System,
    Chat,
    General,
}

impl NotificationCategory {
    /// Urgent categories are displayed ahead of older normal items.
    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            NotificationCategory::TaskChange
                | NotificationCategory::Reward
                | NotificationCategory::System
        )
    }
}

/// A notification item from the remote per-subject feed.
///
/// The remote store is the source of truth; the notification monitor only
/// keeps a last-known snapshot and a processed-id set locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub timestamp_ms: i64,
    pub read: bool,
    pub clicked: bool,
}

/// A notification prepared for on-screen presentation.
///
/// `presentation_id` is locally unique (hash of the domain id combined with
/// current time) and distinct from `record.id`, so rapid deliveries never
/// collide at the platform notification layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedNotification {
    pub presentation_id: i32,
    pub urgent: bool,
    pub record: NotificationRecord,
}

// =============================================================================
// REMINDERS
// =============================================================================

/// A task that may carry a daily "HH:mm" reminder time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderTask {
    pub id: String,
    pub title: String,
    /// Daily reminder wall-clock time as "HH:mm", or None for no reminder.
    pub reminder_time: Option<String>,
}

/// Payload handed to the platform alarm facility for a scheduled reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderAlarm {
    pub task_id: String,
    pub title: String,
    /// Absolute trigger instant, epoch milliseconds.
    pub trigger_at_ms: i64,
}

/// Convert a UTC instant to epoch milliseconds.
pub fn to_epoch_ms(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}
