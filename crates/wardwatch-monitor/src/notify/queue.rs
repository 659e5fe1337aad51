//! Serialized, priority-aware on-screen delivery of notifications.
//!
//! A mutex-guarded list acts as the pending queue. Enqueuing collapses
//! duplicate ids (newest insertion wins); the processing loop displays one
//! item at a time with an urgency-dependent inter-item delay so rapid
//! arrivals never stack visually.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, trace};

use wardwatch_core::defaults;
use wardwatch_core::{
    MonitorDisplay, MonitorEvent, MonitorEventBus, NotificationRecord, NotificationStore,
    PresentedNotification,
};

/// Configuration for the delivery queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Full inter-item delay for normal items. Urgent items wait half of it.
    pub base_delay: Duration,
    /// Poll interval while the queue is empty.
    pub idle_poll: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(defaults::QUEUE_BASE_DELAY_MS),
            idle_poll: Duration::from_millis(defaults::QUEUE_IDLE_POLL_MS),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `QUEUE_BASE_DELAY_MS` | `2000` | Delay after displaying a normal item |
    /// | `QUEUE_IDLE_POLL_MS` | `500` | Poll interval when the queue is empty |
    pub fn from_env() -> Self {
        let base_delay_ms = std::env::var("QUEUE_BASE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::QUEUE_BASE_DELAY_MS);

        let idle_poll_ms = std::env::var("QUEUE_IDLE_POLL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::QUEUE_IDLE_POLL_MS);

        Self {
            base_delay: Duration::from_millis(base_delay_ms),
            idle_poll: Duration::from_millis(idle_poll_ms),
        }
    }

    /// Set the base inter-item delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the empty-queue poll interval.
    pub fn with_idle_poll(mut self, poll: Duration) -> Self {
        self.idle_poll = poll;
        self
    }
}

/// Shared queue state. The pending list and the displaying flag are mutated
/// under one lock so the processing loop and enqueue callers never
/// double-display or lose an update.
#[derive(Debug, Default)]
struct QueueInner {
    pending: Vec<NotificationRecord>,
    displaying: bool,
}

/// Single-consumer notification delivery queue.
pub struct DeliveryQueue {
    subject_id: String,
    store: Arc<dyn NotificationStore>,
    display: Arc<dyn MonitorDisplay>,
    events: MonitorEventBus,
    config: QueueConfig,
    inner: Arc<Mutex<QueueInner>>,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl DeliveryQueue {
    pub fn new(
        subject_id: impl Into<String>,
        store: Arc<dyn NotificationStore>,
        display: Arc<dyn MonitorDisplay>,
        events: MonitorEventBus,
        config: QueueConfig,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            store,
            display,
            events,
            config,
            inner: Arc::new(Mutex::new(QueueInner::default())),
            shutdown: Mutex::new(None),
        }
    }

    /// Add an item to the pending queue.
    ///
    /// Any existing entry with the same id is removed first, so the newest
    /// instance wins while insertion order is otherwise preserved.
    pub async fn enqueue(&self, record: NotificationRecord) {
        let mut inner = self.inner.lock().await;
        inner.pending.retain(|n| n.id != record.id);
        debug!(
            notification_id = %record.id,
            queue_depth = inner.pending.len() + 1,
            "Enqueued notification"
        );
        inner.pending.push(record);
    }

    /// Number of items waiting for display.
    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    /// Start the processing loop. Idempotent: a second call while running
    /// is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            debug!("Delivery queue already running");
            return;
        }
        let (tx, mut rx) = mpsc::channel(1);
        *shutdown = Some(tx);

        let queue = self.clone();
        tokio::spawn(async move {
            info!(subject_id = %queue.subject_id, "Delivery queue started");
            queue.run(&mut rx).await;
            info!(subject_id = %queue.subject_id, "Delivery queue stopped");
        });
    }

    /// Stop the processing loop. Idempotent.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let next = self.take_next().await;

            match next {
                Some(record) => {
                    let urgent = record.category.is_urgent();
                    self.display_item(record, urgent).await;

                    // Inter-item delay prevents visual stacking.
                    let delay = if urgent {
                        self.config.base_delay / 2
                    } else {
                        self.config.base_delay
                    };
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            self.inner.lock().await.displaying = false;
                            break;
                        }
                        _ = sleep(delay) => {}
                    }
                    self.inner.lock().await.displaying = false;
                }
                None => {
                    // Queue empty or still displaying — idle-poll.
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = sleep(self.config.idle_poll) => {}
                    }
                }
            }
        }
    }

    /// Select the next item to display and claim the displaying flag.
    ///
    /// The first urgent-category entry jumps ahead; otherwise the head of
    /// the queue is taken (FIFO).
    async fn take_next(&self) -> Option<NotificationRecord> {
        let mut inner = self.inner.lock().await;
        if inner.displaying || inner.pending.is_empty() {
            return None;
        }
        let idx = inner
            .pending
            .iter()
            .position(|n| n.category.is_urgent())
            .unwrap_or(0);
        inner.displaying = true;
        Some(inner.pending.remove(idx))
    }

    async fn display_item(&self, record: NotificationRecord, urgent: bool) {
        trace!(notification_id = %record.id, urgent, "Displaying notification");

        // Mark-as-read is a side effect of display: fire-and-forget.
        let store = self.store.clone();
        let subject_id = self.subject_id.clone();
        let id = record.id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.mark_read(&subject_id, &id).await {
                error!(notification_id = %id, error = %e, "Failed to mark notification read");
            }
        });

        let presented = PresentedNotification {
            presentation_id: presentation_id(&record.id),
            urgent,
            record,
        };
        self.display.show_notification(&presented).await;
        self.events.emit(MonitorEvent::NotificationDisplayed {
            notification_id: presented.record.id.clone(),
            urgent,
        });
    }
}

/// Derive a locally-unique presentation id from the domain id and the
/// current time, so rapid deliveries never collide at the platform
/// notification layer.
fn presentation_id(domain_id: &str) -> i32 {
    let mut hasher = DefaultHasher::new();
    domain_id.hash(&mut hasher);
    let folded = hasher.finish() ^ Utc::now().timestamp_millis() as u64;
    folded as i32
}
