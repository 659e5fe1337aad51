//! Core traits for wardwatch abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy. Remote persistence, the platform location/geofencing/alarm
//! facilities, and the host's display surface are all external collaborators
//! behind these seams, enabling pluggable backends and testability.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REMOTE STORES
// =============================================================================

/// Remote store of a guardian's geofence zones for a subject.
#[async_trait]
pub trait GeofenceStore: Send + Sync {
    /// Subscribe to the zone set. Each emission carries the full set; the
    /// consumer replaces its local copy wholesale, never merges.
    async fn subscribe(&self, subject_id: &str) -> Result<BoxStream<'static, Vec<Geofence>>>;
}

/// Remote store of subject positions.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Overwrite the subject's current position.
    async fn write_current(&self, subject_id: &str, sample: &LocationSample) -> Result<()>;

    /// Append the sample to the subject's position history. Attempted even
    /// when the current-position overwrite fails.
    async fn append_history(&self, subject_id: &str, sample: &LocationSample) -> Result<()>;
}

/// Remote per-user notification feed.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Subscribe to the subject's notification list. Emissions carry the
    /// full list; an `Err` item terminates the subscription.
    async fn subscribe(
        &self,
        subject_id: &str,
    ) -> Result<BoxStream<'static, Result<Vec<NotificationRecord>>>>;

    /// Mark a notification as read in the remote store.
    async fn mark_read(&self, subject_id: &str, id: &str) -> Result<()>;

    /// Send a notification to a user (subject or guardian).
    async fn send(&self, user_id: &str, record: NotificationRecord) -> Result<()>;
}

// =============================================================================
// PLATFORM PROVIDERS
// =============================================================================

/// Platform foreground-location provider.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether platform location services are currently enabled.
    async fn services_enabled(&self) -> bool;

    /// Request one high-accuracy fix. Settles via its own success/failure
    /// callback; no caller-specified deadline exists.
    async fn current_fix(&self) -> Result<LocationFix>;
}

/// Platform geofencing engine.
///
/// Register/clear are issued fire-and-forget by the registry: failures are
/// logged, never surfaced to callers, never retried.
#[async_trait]
pub trait GeofencingEngine: Send + Sync {
    /// Register a circular region (enter+exit transitions, never expires)
    /// under a stable composite identity.
    async fn register(&self, request: RegionRequest) -> Result<()>;

    /// Remove every region registered under the given request identity.
    async fn clear_all(&self, request_identity: &str) -> Result<()>;
}

/// Platform exact-alarm facility.
pub trait AlarmBackend: Send + Sync {
    /// Whether the platform currently grants exact-alarm scheduling.
    fn can_schedule_exact(&self) -> bool;

    /// Program an exact, allow-while-idle wake alarm. A repeated request
    /// code replaces the prior alarm.
    fn schedule_exact(&self, request_code: i32, alarm: ReminderAlarm) -> Result<()>;

    /// Cancel a pending alarm by request code, looking it up without
    /// creating one. Returns whether an alarm existed.
    fn cancel_existing(&self, request_code: i32) -> bool;
}

/// Platform default-network watcher.
#[async_trait]
pub trait NetworkWatcher: Send + Sync {
    /// Register for default-network callbacks.
    ///
    /// Returns the synchronously-evaluated capabilities of the currently
    /// active network (None when no network is active) together with the
    /// event stream. Fails with [`crate::Error::PermissionDenied`] when the
    /// platform rejects the callback registration.
    async fn watch(
        &self,
    ) -> Result<(Option<NetworkCapabilities>, BoxStream<'static, NetworkEvent>)>;
}

// =============================================================================
// HOST DISPLAY SURFACE
// =============================================================================

/// Display callbacks implemented by the host application.
///
/// Exactly two operations; the host owns channel/priority/sound selection
/// for the platform notification it builds.
#[async_trait]
pub trait MonitorDisplay: Send + Sync {
    /// Render a notification on screen.
    async fn show_notification(&self, presented: &PresentedNotification);

    /// Update the persistent ongoing status indicator.
    async fn update_ongoing_status(&self, message: &str);
}
