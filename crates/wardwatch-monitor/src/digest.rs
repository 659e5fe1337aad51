//! Daily task digest, recomputed on the host's "data changed" signal.
//!
//! Decoupled from the monitors: the host calls [`TaskDigest::on_data_changed`]
//! whenever the task list changes, and the recomputed summary is delivered
//! through the regular notification queue under a stable id so repeated
//! recomputations collapse to the newest digest.

use std::sync::Arc;

use chrono::{Local, Timelike};
use tracing::debug;

use wardwatch_core::{NotificationCategory, NotificationRecord, ReminderTask};

use crate::alarm::parse_reminder_time;
use crate::notify::DeliveryQueue;

/// Stable notification id for the digest; duplicate enqueues collapse.
const DIGEST_ID: &str = "task-digest";

/// Summary of today's reminder schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSummary {
    /// Total tasks in the list.
    pub total: usize,
    /// Tasks carrying a valid reminder time.
    pub with_reminder: usize,
    /// Reminders still ahead of the given wall-clock time today.
    pub remaining_today: usize,
}

/// Compute the digest summary for a task list at the given local time.
pub fn summarize(tasks: &[ReminderTask], now_hour: u32, now_minute: u32) -> DigestSummary {
    let now = (now_hour, now_minute);
    let mut with_reminder = 0;
    let mut remaining_today = 0;
    for task in tasks {
        let parsed = task.reminder_time.as_deref().and_then(parse_reminder_time);
        if let Some(reminder) = parsed {
            with_reminder += 1;
            if reminder > now {
                remaining_today += 1;
            }
        }
    }
    DigestSummary {
        total: tasks.len(),
        with_reminder,
        remaining_today,
    }
}

/// Recomputes and delivers the daily task digest.
pub struct TaskDigest {
    queue: Arc<DeliveryQueue>,
}

impl TaskDigest {
    pub fn new(queue: Arc<DeliveryQueue>) -> Self {
        Self { queue }
    }

    /// Recompute the digest from the latest task list and enqueue it.
    pub async fn on_data_changed(&self, tasks: &[ReminderTask]) -> DigestSummary {
        let now = Local::now();
        let summary = summarize(tasks, now.hour(), now.minute());
        debug!(
            total = summary.total,
            remaining_today = summary.remaining_today,
            "Task digest recomputed"
        );

        let record = NotificationRecord {
            id: DIGEST_ID.to_string(),
            category: NotificationCategory::General,
            title: "Today's quests".to_string(),
            message: format!(
                "{} quests, {} reminders still ahead today",
                summary.total, summary.remaining_today
            ),
            timestamp_ms: now.timestamp_millis(),
            read: false,
            clicked: false,
        };
        self.queue.enqueue(record).await;
        summary
    }
}
