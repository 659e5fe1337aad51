//! Centralized default constants for the wardwatch monitoring system.
//!
//! **This module is the single source of truth** for all shared default
//! values. The monitoring components reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by component. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// LOCATION POLLER
// =============================================================================

/// Interval between location sampling cycles, in seconds.
pub const POLL_INTERVAL_SECS: u64 = 60;

/// Samples with a reported accuracy radius above this value (meters) are
/// discarded without a write or an alert.
pub const ACCURACY_LIMIT_M: f64 = 200.0;

/// Minimum elapsed time between two alerts of the same kind, in seconds.
pub const ALERT_COOLDOWN_SECS: u64 = 300;

// =============================================================================
// NOTIFICATION MONITOR
// =============================================================================

/// Delay before the notification monitor subscribes to the remote feed,
/// in seconds. Avoids racing host-application startup.
pub const MONITOR_START_DELAY_SECS: u64 = 5;

// =============================================================================
// DELIVERY QUEUE
// =============================================================================

/// Base inter-item display delay, in milliseconds. Normal-priority items
/// wait the full delay; urgent items wait half of it.
pub const QUEUE_BASE_DELAY_MS: u64 = 2000;

/// Poll interval when the queue is empty, in milliseconds.
pub const QUEUE_IDLE_POLL_MS: u64 = 500;

// =============================================================================
// EVENT BUS
// =============================================================================

/// Broadcast channel capacity for the monitor event bus. Lagging receivers
/// drop the oldest events rather than blocking senders.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// ONGOING STATUS MESSAGES
// =============================================================================

/// Status shown while both monitors are running.
pub const STATUS_MONITORING_ACTIVE: &str = "Monitoring active";

/// Status shown before the first validated network is seen.
pub const STATUS_WAITING_FOR_NETWORK: &str = "Waiting for network connection...";

/// Status shown when the active network is lost or loses validation.
pub const STATUS_NETWORK_ISSUE: &str = "Network connectivity issue, monitoring paused";

/// Status shown when registering the network callback was denied.
pub const STATUS_NETWORK_PERMISSION: &str =
    "Network monitoring unavailable: missing permission";

/// Status shown when the notification subscription failed.
pub const STATUS_NOTIFICATION_FEED_FAILED: &str =
    "Notification feed unavailable, restart monitoring to resume";
