//! Integration tests for the connectivity supervisor: seeding, idempotent
//! transitions, and permission failure handling.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{eventually, eventually_async, init_tracing};
use common::{
    MockDisplay, MockGeofenceStore, MockLocationProvider, MockLocationStore,
    MockNetworkWatcher, MockNotificationStore,
};
use wardwatch_core::defaults::{
    STATUS_MONITORING_ACTIVE, STATUS_NETWORK_ISSUE, STATUS_NETWORK_PERMISSION,
    STATUS_WAITING_FOR_NETWORK,
};
use wardwatch_core::{
    ConnectivityState, MonitorEvent, MonitorEventBus, NetworkCapabilities, NetworkEvent,
};
use wardwatch_monitor::{
    ConnectivitySupervisor, DeliveryQueue, LocationPoller, NotificationMonitor, NotifyConfig,
    PollerConfig, PollerIdentity, QueueConfig,
};

const SUBJECT: &str = "subject-1";
const GUARDIAN: &str = "guardian-1";

fn usable() -> NetworkCapabilities {
    NetworkCapabilities {
        has_internet: true,
        validated: true,
    }
}

fn unvalidated() -> NetworkCapabilities {
    NetworkCapabilities {
        has_internet: true,
        validated: false,
    }
}

struct Rig {
    supervisor: Arc<ConnectivitySupervisor>,
    watcher: Arc<MockNetworkWatcher>,
    geofences: Arc<MockGeofenceStore>,
    notifications: Arc<MockNotificationStore>,
    display: Arc<MockDisplay>,
    events: MonitorEventBus,
}

fn rig(seed: Option<NetworkCapabilities>) -> Rig {
    init_tracing();
    let watcher = Arc::new(MockNetworkWatcher::with_seed(seed));
    let geofences = Arc::new(MockGeofenceStore::default());
    let locations = Arc::new(MockLocationStore::default());
    let notifications = Arc::new(MockNotificationStore::default());
    let provider = Arc::new(MockLocationProvider::default());
    let display = Arc::new(MockDisplay::default());
    let events = MonitorEventBus::new(64);

    let queue = Arc::new(DeliveryQueue::new(
        SUBJECT,
        notifications.clone(),
        display.clone(),
        events.clone(),
        QueueConfig::default().with_idle_poll(Duration::from_millis(5)),
    ));
    let poller = Arc::new(LocationPoller::new(
        PollerIdentity {
            subject_id: SUBJECT.into(),
            subject_name: "Alex".into(),
            guardian_id: GUARDIAN.into(),
        },
        geofences.clone(),
        locations,
        notifications.clone(),
        provider,
        events.clone(),
        PollerConfig::default().with_poll_interval(Duration::from_secs(3600)),
    ));
    let monitor = Arc::new(NotificationMonitor::new(
        SUBJECT,
        notifications.clone(),
        queue,
        display.clone(),
        NotifyConfig::default().with_start_delay(Duration::from_millis(0)),
    ));
    let supervisor = Arc::new(ConnectivitySupervisor::new(
        watcher.clone(),
        poller,
        monitor,
        display.clone(),
        events.clone(),
    ));
    Rig {
        supervisor,
        watcher,
        geofences,
        notifications,
        display,
        events,
    }
}

#[tokio::test]
async fn usable_seed_starts_monitors_before_any_event() {
    let rig = rig(Some(usable()));
    rig.supervisor.start().await;

    eventually_async("state available", || async {
        rig.supervisor.state().await == ConnectivityState::Available
    })
    .await;
    eventually("poller subscribed to zones", || {
        rig.geofences.subscription_count() == 1
    })
    .await;
    eventually("monitor subscribed to feed", || {
        rig.notifications.subscription_count() == 1
    })
    .await;
    assert_eq!(
        rig.display.last_status().as_deref(),
        Some(STATUS_MONITORING_ACTIVE)
    );

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn missing_seed_reports_waiting_status() {
    let rig = rig(None);
    rig.supervisor.start().await;

    eventually_async("state unavailable", || async {
        rig.supervisor.state().await == ConnectivityState::Unavailable
    })
    .await;
    assert_eq!(
        rig.display.last_status().as_deref(),
        Some(STATUS_WAITING_FOR_NETWORK)
    );
    assert_eq!(rig.geofences.subscription_count(), 0);

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn restart_after_stop_resumes_monitoring() {
    let rig = rig(Some(usable()));
    rig.supervisor.start().await;
    eventually("monitors running", || {
        rig.geofences.subscription_count() == 1
    })
    .await;

    rig.supervisor.stop().await;
    eventually_async("state reset on stop", || async {
        rig.supervisor.state().await == ConnectivityState::Unknown
    })
    .await;

    // The network is still usable: a fresh start must seed Available again
    // and bring the monitors back up.
    rig.supervisor.start().await;
    eventually_async("state available after restart", || async {
        rig.supervisor.state().await == ConnectivityState::Available
    })
    .await;
    eventually("poller resubscribed after restart", || {
        rig.geofences.subscription_count() == 2
    })
    .await;
    eventually("monitor resubscribed after restart", || {
        rig.notifications.subscription_count() == 2
    })
    .await;
    assert_eq!(
        rig.display.last_status().as_deref(),
        Some(STATUS_MONITORING_ACTIVE)
    );

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn duplicate_available_events_do_not_restart_monitors() {
    let rig = rig(Some(usable()));
    let mut bus = rig.events.subscribe();
    rig.supervisor.start().await;
    eventually("monitors running", || {
        rig.geofences.subscription_count() == 1
    })
    .await;

    rig.watcher.emit(NetworkEvent::CapabilitiesChanged(usable()));
    rig.watcher.emit(NetworkEvent::Available(usable()));
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Still exactly one zone subscription: nothing was restarted.
    assert_eq!(rig.geofences.subscription_count(), 1);

    let mut started_count = 0;
    while let Ok(event) = bus.try_recv() {
        if event == MonitorEvent::MonitorsStarted {
            started_count += 1;
        }
    }
    assert_eq!(started_count, 1);

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn lost_network_stops_monitors_and_reports_issue() {
    let rig = rig(Some(usable()));
    rig.supervisor.start().await;
    eventually("monitors running", || {
        rig.geofences.subscription_count() == 1
    })
    .await;

    rig.watcher.emit(NetworkEvent::Lost);
    eventually_async("state unavailable", || async {
        rig.supervisor.state().await == ConnectivityState::Unavailable
    })
    .await;
    eventually("issue status set", || {
        rig.display.last_status().as_deref() == Some(STATUS_NETWORK_ISSUE)
    })
    .await;

    // Recovery re-starts the monitors (fresh zone subscription).
    rig.watcher.emit(NetworkEvent::Available(usable()));
    eventually("monitors restarted", || {
        rig.geofences.subscription_count() == 2
    })
    .await;

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn unvalidated_capabilities_count_as_unavailable() {
    let rig = rig(Some(usable()));
    rig.supervisor.start().await;
    eventually("monitors running", || {
        rig.geofences.subscription_count() == 1
    })
    .await;

    rig.watcher
        .emit(NetworkEvent::CapabilitiesChanged(unvalidated()));
    eventually_async("state unavailable", || async {
        rig.supervisor.state().await == ConnectivityState::Unavailable
    })
    .await;
    assert_eq!(
        rig.display.last_status().as_deref(),
        Some(STATUS_NETWORK_ISSUE)
    );

    rig.supervisor.stop().await;
}

#[tokio::test]
async fn permission_denial_reports_status_and_leaves_monitors_stopped() {
    let rig = rig(Some(usable()));
    rig.watcher
        .deny_permission
        .store(true, std::sync::atomic::Ordering::SeqCst);

    rig.supervisor.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        rig.display.last_status().as_deref(),
        Some(STATUS_NETWORK_PERMISSION)
    );
    assert_eq!(rig.supervisor.state().await, ConnectivityState::Unknown);
    assert_eq!(rig.geofences.subscription_count(), 0);
    assert_eq!(rig.notifications.subscription_count(), 0);
}
