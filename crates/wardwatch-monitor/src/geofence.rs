//! Platform geofence registration.
//!
//! Mirrors the guardian's remote zone set into the platform geofencing
//! engine. A registration pass clears the previously registered regions and
//! re-registers every zone received from the subscription, keyed by a stable
//! composite identity so repeated passes replace rather than accumulate.
//!
//! Register and clear calls are fire-and-forget against the engine: failures
//! are logged, never surfaced, never retried.
//!
//! Known non-atomicity: the initial clear is issued without awaiting its
//! completion, so the per-zone registrations that follow can race a still
//! in-flight clear. Serializing the two phases would change observable
//! timing, so the race is preserved and flagged here instead of fixed.
//!
//! Related window: the engine is cleared once per pass, at its start. A zone
//! deleted remotely in a later emission of the same pass stays registered
//! with the platform until the next full pass re-clears.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use wardwatch_core::{GeofenceStore, GeofencingEngine, RegionRequest};

/// Registration pass state for one subject. An explicit tagged state rather
/// than a bare boolean, so the in-flight pass owns its cancellation channel.
enum PassState {
    Idle,
    InFlight(mpsc::Sender<()>),
}

/// Mirrors remote geofence zones into the platform engine for one subject.
pub struct GeofenceRegistry {
    guardian_id: String,
    subject_id: String,
    subject_name: String,
    store: Arc<dyn GeofenceStore>,
    engine: Arc<dyn GeofencingEngine>,
    pass: Arc<Mutex<PassState>>,
}

impl GeofenceRegistry {
    pub fn new(
        guardian_id: impl Into<String>,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
        store: Arc<dyn GeofenceStore>,
        engine: Arc<dyn GeofencingEngine>,
    ) -> Self {
        Self {
            guardian_id: guardian_id.into(),
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            store,
            engine,
            pass: Arc::new(Mutex::new(PassState::Idle)),
        }
    }

    /// The request identity all of this subject's regions are registered
    /// under.
    pub fn request_identity(&self) -> String {
        format!("{}|{}", self.guardian_id, self.subject_name)
    }

    /// Begin a registration pass. Returns false when a pass is already in
    /// flight for this subject (reentrancy guard).
    pub async fn register_zones(self: &Arc<Self>) -> bool {
        let mut pass = self.pass.lock().await;
        if matches!(*pass, PassState::InFlight(_)) {
            debug!(subject_id = %self.subject_id, "Registration pass already in flight, skipping");
            return false;
        }
        let (tx, mut rx) = mpsc::channel(1);
        *pass = PassState::InFlight(tx);
        drop(pass);

        // Clear is issued fire-and-forget; the zone registrations below do
        // NOT wait for it (see module docs on the preserved race).
        self.spawn_clear();

        let registry = self.clone();
        tokio::spawn(async move {
            info!(subject_id = %registry.subject_id, "Geofence registration pass started");
            registry.run(&mut rx).await;
            *registry.pass.lock().await = PassState::Idle;
            info!(subject_id = %registry.subject_id, "Geofence registration pass ended");
        });
        true
    }

    /// Cancel an in-flight registration pass. Idempotent.
    pub async fn cancel(&self) {
        let mut pass = self.pass.lock().await;
        if let PassState::InFlight(tx) = std::mem::replace(&mut *pass, PassState::Idle) {
            let _ = tx.send(()).await;
        }
    }

    /// Remove every region registered under this subject's request identity.
    /// Independent of whether a registration pass is running.
    pub fn clear_all(&self) {
        self.spawn_clear();
    }

    fn spawn_clear(&self) {
        let engine = self.engine.clone();
        let identity = self.request_identity();
        tokio::spawn(async move {
            match engine.clear_all(&identity).await {
                Ok(()) => debug!(request_identity = %identity, "Cleared registered geofences"),
                Err(e) => {
                    error!(request_identity = %identity, error = %e, "Failed to clear geofences")
                }
            }
        });
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        let mut zones = match self.store.subscribe(&self.subject_id).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    subject_id = %self.subject_id,
                    error = %e,
                    "Geofence subscription failed, pass abandoned"
                );
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                update = zones.next() => match update {
                    Some(set) => {
                        debug!(
                            subject_id = %self.subject_id,
                            zone_count = set.len(),
                            "Registering zone set with platform engine"
                        );
                        for zone in set {
                            self.register_zone(&zone.name, zone.center, zone.radius_m).await;
                        }
                    }
                    None => {
                        warn!(subject_id = %self.subject_id, "Geofence subscription ended");
                        break;
                    }
                },
            }
        }
    }

    /// Register one circular region (enter+exit, never expires) under the
    /// composite identity. Fire-and-forget: the outcome is only logged.
    async fn register_zone(&self, name: &str, center: wardwatch_core::GeoPoint, radius_m: f64) {
        let request = RegionRequest {
            region_id: RegionRequest::region_id_for(name, &self.guardian_id, &self.subject_name),
            center,
            radius_m,
        };
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let region_id = request.region_id.clone();
            match engine.register(request).await {
                Ok(()) => debug!(zone_id = %region_id, "Registered geofence region"),
                Err(e) => error!(zone_id = %region_id, error = %e, "Failed to register geofence region"),
            }
        });
    }
}
