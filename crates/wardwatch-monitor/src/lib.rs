//! # wardwatch-monitor
//!
//! Background monitoring components for the wardwatch guardian/ward tracking
//! system.
//!
//! This crate provides:
//! - Connectivity-gated lifecycle supervision of the monitors
//! - Fixed-cadence location polling with throttled geofence-exit alerts
//! - Platform geofence registration from the remote zone set
//! - Notification feed diffing into a priority-aware delivery queue
//! - Exact wake-alarm scheduling for daily "HH:mm" reminders
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wardwatch_core::MonitorEventBus;
//! use wardwatch_monitor::{
//!     ConnectivitySupervisor, DeliveryQueue, LocationPoller, NotificationMonitor,
//!     NotifyConfig, PollerConfig, PollerIdentity, QueueConfig,
//! };
//!
//! let events = MonitorEventBus::default();
//! let queue = Arc::new(DeliveryQueue::new(
//!     "subject-1", notification_store.clone(), display.clone(),
//!     events.clone(), QueueConfig::from_env(),
//! ));
//! let poller = Arc::new(LocationPoller::new(
//!     identity, geofence_store, location_store, notification_store.clone(),
//!     location_provider, events.clone(), PollerConfig::from_env(),
//! ));
//! let monitor = Arc::new(NotificationMonitor::new(
//!     "subject-1", notification_store, queue.clone(), display.clone(),
//!     NotifyConfig::from_env(),
//! ));
//!
//! queue.start().await;
//! let supervisor = Arc::new(ConnectivitySupervisor::new(
//!     network_watcher, poller, monitor, display, events,
//! ));
//! supervisor.start().await;
//! ```

pub mod alarm;
pub mod connectivity;
pub mod digest;
pub mod geofence;
pub mod location;
pub mod notify;

// Re-export core types
pub use wardwatch_core::*;

pub use alarm::{next_trigger_after, parse_reminder_time, request_code_for, AlarmScheduler};
pub use connectivity::ConnectivitySupervisor;
pub use digest::{summarize, DigestSummary, TaskDigest};
pub use geofence::GeofenceRegistry;
pub use location::{LocationPoller, PollerConfig, PollerIdentity};
pub use notify::{DeliveryQueue, NotificationMonitor, NotifyConfig, QueueConfig};
