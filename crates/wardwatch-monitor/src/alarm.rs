//! Exact wake-alarm scheduling for daily "HH:mm" task reminders.
//!
//! Next-trigger instants are re-derived from the wall clock on every
//! scheduling call; no "next fire" field is persisted anywhere. When the
//! platform denies exact-alarm scheduling the reminder is logged and skipped
//! with no inexact fallback substituted.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{debug, info, warn};

use wardwatch_core::{AlarmBackend, ReminderAlarm, ReminderTask};

/// Parse a "HH:mm" reminder time, validating hour 0-23 and minute 0-59.
pub fn parse_reminder_time(value: &str) -> Option<(u32, u32)> {
    let (hour_str, minute_str) = value.split_once(':')?;
    let hour: u32 = hour_str.parse().ok()?;
    let minute: u32 = minute_str.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Next trigger instant for a daily HH:mm reminder relative to `now`:
/// today at that time if still in the future, otherwise the same time
/// tomorrow.
pub fn next_trigger_after(now: NaiveDateTime, hour: u32, minute: u32) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    let today = now.date().and_time(time);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Stable alarm request code derived from a task id, so rescheduling the
/// same task replaces its prior alarm.
pub fn request_code_for(task_id: &str) -> i32 {
    let mut hasher = DefaultHasher::new();
    task_id.hash(&mut hasher);
    hasher.finish() as i32
}

/// Schedules and cancels reminder alarms through the platform backend.
pub struct AlarmScheduler {
    backend: Arc<dyn AlarmBackend>,
}

impl AlarmScheduler {
    pub fn new(backend: Arc<dyn AlarmBackend>) -> Self {
        Self { backend }
    }

    /// Schedule (or replace) the reminder alarm for a task.
    ///
    /// A task with no reminder time, or with a malformed one, has any
    /// existing alarm cancelled instead.
    pub fn schedule_reminder(&self, task: &ReminderTask) {
        let reminder = match task.reminder_time.as_deref() {
            Some(value) => value,
            None => {
                self.cancel_reminder(task);
                return;
            }
        };

        let (hour, minute) = match parse_reminder_time(reminder) {
            Some(parts) => parts,
            None => {
                warn!(
                    task_id = %task.id,
                    reminder,
                    "Malformed reminder time, cancelling any existing alarm"
                );
                self.cancel_reminder(task);
                return;
            }
        };

        if !self.backend.can_schedule_exact() {
            // Deliberate limitation: no inexact fallback.
            warn!(task_id = %task.id, "Exact alarms not permitted, skipping reminder");
            return;
        }

        let next = next_trigger_after(Local::now().naive_local(), hour, minute);
        let trigger_at_ms = match Local.from_local_datetime(&next) {
            chrono::LocalResult::Single(instant) => instant.timestamp_millis(),
            chrono::LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
            chrono::LocalResult::None => {
                warn!(task_id = %task.id, ?next, "Trigger falls in a local-time gap, skipping");
                return;
            }
        };

        let request_code = request_code_for(&task.id);
        let alarm = ReminderAlarm {
            task_id: task.id.clone(),
            title: task.title.clone(),
            trigger_at_ms,
        };
        match self.backend.schedule_exact(request_code, alarm) {
            Ok(()) => {
                info!(task_id = %task.id, request_code, trigger_at_ms, "Reminder alarm scheduled");
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Failed to schedule reminder alarm");
            }
        }
    }

    /// Cancel an existing pending alarm for a task; no-op when absent.
    pub fn cancel_reminder(&self, task: &ReminderTask) {
        let request_code = request_code_for(&task.id);
        if self.backend.cancel_existing(request_code) {
            debug!(task_id = %task.id, request_code, "Reminder alarm cancelled");
        }
    }

    /// Schedule reminders for every task in the list.
    pub fn schedule_all(&self, tasks: &[ReminderTask]) {
        for task in tasks {
            self.schedule_reminder(task);
        }
    }

    /// Cancel reminders for every task in the list.
    pub fn cancel_all(&self, tasks: &[ReminderTask]) {
        for task in tasks {
            self.cancel_reminder(task);
        }
    }
}
