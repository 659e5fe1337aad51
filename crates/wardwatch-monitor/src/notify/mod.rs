//! Notification feed monitoring and delivery.

pub mod monitor;
pub mod queue;

pub use monitor::{NotificationMonitor, NotifyConfig};
pub use queue::{DeliveryQueue, QueueConfig};
