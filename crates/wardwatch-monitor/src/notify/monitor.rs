//! Remote notification feed monitor.
//!
//! Subscribes to the per-subject feed after a short startup delay, diffs each
//! emission against the previous snapshot to find newly-arrived unread items,
//! and forwards them to the delivery queue.
//!
//! Deduplication is double-layered: snapshot absence detects "new since last
//! emission", and the processed-id set guards against re-delivery when the
//! same item reappears in a later emission before being marked read remotely.
//!
//! A subscription error stops monitoring and sets a diagnostic status. The
//! monitor does **not** auto-restart; an explicit `start()` call is required
//! again. Fail-closed on purpose.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use wardwatch_core::defaults;
use wardwatch_core::{MonitorDisplay, NotificationRecord, NotificationStore};

use super::queue::DeliveryQueue;

/// Configuration for the notification monitor.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Delay before subscribing, to avoid racing host startup.
    pub start_delay: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(defaults::MONITOR_START_DELAY_SECS),
        }
    }
}

impl NotifyConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NOTIFY_START_DELAY_SECS` | `5` | Delay before the feed subscription |
    pub fn from_env() -> Self {
        let start_delay_secs = std::env::var("NOTIFY_START_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::MONITOR_START_DELAY_SECS);

        Self {
            start_delay: Duration::from_secs(start_delay_secs),
        }
    }

    /// Set the pre-subscription delay.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }
}

/// Diffing state: the last known feed snapshot plus ids already forwarded.
#[derive(Debug, Default)]
struct DiffState {
    snapshot_ids: HashSet<String>,
    processed_ids: HashSet<String>,
}

impl DiffState {
    /// Diff an emission against the snapshot and return the items to forward.
    ///
    /// New = unread and absent from the previous snapshot; the processed set
    /// additionally suppresses re-delivery. The snapshot is replaced with the
    /// latest list regardless of whether new items were found.
    fn take_new(&mut self, latest: &[NotificationRecord]) -> Vec<NotificationRecord> {
        let mut fresh = Vec::new();
        for item in latest {
            if item.read || self.snapshot_ids.contains(&item.id) {
                continue;
            }
            if self.processed_ids.contains(&item.id) {
                continue;
            }
            self.processed_ids.insert(item.id.clone());
            fresh.push(item.clone());
        }
        self.snapshot_ids = latest.iter().map(|n| n.id.clone()).collect();
        fresh
    }
}

/// Monitors the remote notification feed for one subject.
pub struct NotificationMonitor {
    subject_id: String,
    store: Arc<dyn NotificationStore>,
    queue: Arc<DeliveryQueue>,
    display: Arc<dyn MonitorDisplay>,
    config: NotifyConfig,
    state: Arc<Mutex<DiffState>>,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl NotificationMonitor {
    pub fn new(
        subject_id: impl Into<String>,
        store: Arc<dyn NotificationStore>,
        queue: Arc<DeliveryQueue>,
        display: Arc<dyn MonitorDisplay>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            store,
            queue,
            display,
            config,
            state: Arc::new(Mutex::new(DiffState::default())),
            shutdown: Mutex::new(None),
        }
    }

    /// Start monitoring. Idempotent while running.
    pub async fn start(self: &Arc<Self>) {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            debug!(subject_id = %self.subject_id, "Notification monitor already running");
            return;
        }
        let (tx, mut rx) = mpsc::channel(1);
        *shutdown = Some(tx.clone());

        let monitor = self.clone();
        tokio::spawn(async move {
            info!(subject_id = %monitor.subject_id, "Notification monitor started");
            monitor.run(&mut rx).await;
            // Release the running guard so a later start() can succeed, but
            // only if it is still this task's sender: a quick stop()/start()
            // may already have installed a successor, which must stay.
            let mut guard = monitor.shutdown.lock().await;
            if guard.as_ref().map_or(false, |current| current.same_channel(&tx)) {
                *guard = None;
            }
            drop(guard);
            info!(subject_id = %monitor.subject_id, "Notification monitor stopped");
        });
    }

    /// Stop monitoring and cancel the subscription. Idempotent.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }
    }

    /// Reset both the snapshot and the processed-id set. Used when the host
    /// switches subjects.
    pub async fn clear_processed(&self) {
        let mut state = self.state.lock().await;
        state.snapshot_ids.clear();
        state.processed_ids.clear();
        debug!(subject_id = %self.subject_id, "Cleared notification diff state");
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        // Initial delay avoids racing app startup.
        tokio::select! {
            _ = shutdown_rx.recv() => return,
            _ = sleep(self.config.start_delay) => {}
        }

        let mut feed = match self.store.subscribe(&self.subject_id).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(subject_id = %self.subject_id, error = %e, "Notification subscription failed");
                self.display
                    .update_ongoing_status(defaults::STATUS_NOTIFICATION_FEED_FAILED)
                    .await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                emission = feed.next() => match emission {
                    Some(Ok(latest)) => self.process_emission(latest).await,
                    Some(Err(e)) => {
                        // Fail-closed: no automatic resubscribe.
                        error!(subject_id = %self.subject_id, error = %e, "Notification feed error, monitoring halted");
                        self.display
                            .update_ongoing_status(defaults::STATUS_NOTIFICATION_FEED_FAILED)
                            .await;
                        break;
                    }
                    None => {
                        warn!(subject_id = %self.subject_id, "Notification feed ended");
                        break;
                    }
                },
            }
        }
    }

    async fn process_emission(&self, latest: Vec<NotificationRecord>) {
        let fresh = self.state.lock().await.take_new(&latest);
        if fresh.is_empty() {
            return;
        }
        debug!(
            subject_id = %self.subject_id,
            count = fresh.len(),
            "Forwarding new notifications to delivery queue"
        );
        for item in fresh {
            self.queue.enqueue(item).await;
        }
    }
}
