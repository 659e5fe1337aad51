//! Structured logging field name constants for wardwatch.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every component.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded monitoring, requires operator attention |
//! | WARN  | Recoverable issue, operation skipped or throttled |
//! | INFO  | Lifecycle events (start, stop), state transitions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (individual samples, queue entries) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Component originating the log event.
/// Values: "connectivity", "location", "geofence", "notify", "queue", "alarm"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "sample_cycle", "register_pass", "enqueue", "schedule"
pub const OPERATION: &str = "op";

/// Identifier of the monitored subject (the ward).
pub const SUBJECT_ID: &str = "subject_id";

/// Identifier of the guardian receiving alerts.
pub const GUARDIAN_ID: &str = "guardian_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Notification record identifier.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Geofence zone identifier.
pub const ZONE_ID: &str = "zone_id";

/// Reminder task identifier.
pub const TASK_ID: &str = "task_id";

/// Alarm request code derived from a task id.
pub const REQUEST_CODE: &str = "request_code";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Reported accuracy radius of a location fix in meters.
pub const ACCURACY_M: &str = "accuracy_m";

/// Great-circle distance in meters.
pub const DISTANCE_M: &str = "distance_m";

/// Number of zones in the active geofence set.
pub const ZONE_COUNT: &str = "zone_count";

/// Number of pending entries in the delivery queue.
pub const QUEUE_DEPTH: &str = "queue_depth";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
