use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Ride, RideSnapshot, RideStatus};
use crate::mirror::{active_ride_path, MirrorClient, ACTIVE_RIDES};
use crate::ride_actor::{RideError, RideFilter, RidePatch};

/// What one sweep found and fixed. Each list holds ride ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Durable records that had no live copy and got one.
    pub remirrored: Vec<String>,
    /// Live copies brought back in line with the durable record.
    pub mirror_repaired: Vec<String>,
    /// Durable records that took a terminal status from the live copy.
    pub durable_repaired: Vec<String>,
    /// Live copies with no durable record. Reported, not touched.
    pub orphaned_mirrors: Vec<String>,
    /// Repairs that were attempted but failed.
    pub failures: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.remirrored.is_empty()
            && self.mirror_repaired.is_empty()
            && self.durable_repaired.is_empty()
            && self.failures == 0
    }
}

/// Sweeps both stores and repairs drift left by half-finished dual writes.
///
/// Policy:
/// - a durable record with no live copy is re-mirrored;
/// - when exactly one side is terminal, the terminal status is copied to
///   the other side, unless the durable record could no longer take it
///   (e.g. live `cancelled`, durable `started`); then, and when both are
///   terminal but differ, the durable record wins;
/// - differing non-terminal statuses are an in-flight write and are left alone;
/// - with equal status, route and fare fields are copied from the durable
///   record to the live copy.
#[derive(Clone)]
pub struct Reconciler {
    rides: ResourceClient<Ride>,
    mirror: MirrorClient,
}

impl Reconciler {
    pub fn new(rides: ResourceClient<Ride>, mirror: MirrorClient) -> Self {
        Self { rides, mirror }
    }

    #[instrument(name = "reconcile", skip(self))]
    pub async fn reconcile_once(&self) -> Result<ReconcileReport, RideError> {
        let rides = self
            .rides
            .query(RideFilter::All, usize::MAX)
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))?;
        let prefix = format!("{}/", ACTIVE_RIDES);
        let mut live: HashMap<String, Value> = self
            .mirror
            .list(ACTIVE_RIDES.to_string())
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))?
            .into_iter()
            .filter_map(|(path, value)| path.strip_prefix(&prefix).map(|id| (id.to_string(), value)))
            .collect();

        let mut report = ReconcileReport::default();
        for ride in rides {
            match live.remove(&ride.id) {
                None => self.remirror(&ride, &mut report).await,
                Some(value) => match RideSnapshot::from_value(value) {
                    Ok(snapshot) => self.compare(&ride, &snapshot, &mut report).await,
                    Err(e) => {
                        warn!(ride_id = %ride.id, error = %e, "Live copy undecodable, rewriting");
                        self.remirror(&ride, &mut report).await;
                    }
                },
            }
        }

        for orphan in live.into_keys() {
            warn!(ride_id = %orphan, "Live copy has no ride record");
            report.orphaned_mirrors.push(orphan);
        }
        report.orphaned_mirrors.sort();

        if report.is_clean() {
            debug!("Stores agree");
        } else {
            info!(
                remirrored = report.remirrored.len(),
                mirror_repaired = report.mirror_repaired.len(),
                durable_repaired = report.durable_repaired.len(),
                failures = report.failures,
                "Reconciliation pass finished"
            );
        }
        Ok(report)
    }

    /// Sweep every `interval` until `stop` fires or its sender is dropped.
    pub async fn run(self, interval: Duration, mut stop: oneshot::Receiver<()>) {
        // First sweep one interval after start, not immediately.
        let mut timer = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        info!(interval_secs = interval.as_secs(), "Reconciler starting");
        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = timer.tick() => {
                    if let Err(e) = self.reconcile_once().await {
                        error!(error = %e, "Reconciliation pass failed");
                    }
                }
            }
        }
        info!("Reconciler stopped");
    }

    async fn remirror(&self, ride: &Ride, report: &mut ReconcileReport) {
        let snapshot = RideSnapshot::from_ride(ride, ride.created_at.timestamp_millis());
        let written = match snapshot.to_value() {
            Ok(value) => self.mirror.set(active_ride_path(&ride.id), value).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match written {
            Ok(()) => {
                info!(ride_id = %ride.id, "Re-mirrored ride record");
                report.remirrored.push(ride.id.clone());
            }
            Err(e) => {
                error!(ride_id = %ride.id, error = %e, "Re-mirroring failed");
                report.failures += 1;
            }
        }
    }

    async fn compare(&self, ride: &Ride, snapshot: &RideSnapshot, report: &mut ReconcileReport) {
        let durable_done = ride.status.is_terminal();
        let live_done = snapshot.status.is_terminal();

        if ride.status != snapshot.status {
            if durable_done {
                self.push_status_to_mirror(ride, report).await;
            } else if live_done && ride.status.can_become(snapshot.status) {
                self.push_status_to_durable(ride, snapshot.status, report).await;
            } else if live_done {
                // The ride moved on before the rider's write reached the record.
                self.push_status_to_mirror(ride, report).await;
            } else {
                debug!(
                    ride_id = %ride.id,
                    durable = %ride.status,
                    live = %snapshot.status,
                    "Statuses differ mid-flight, leaving alone"
                );
            }
            return;
        }

        if !snapshot.agrees_with(ride) {
            self.patch_mirror(ride, route_fields(ride), report).await;
        }
    }

    async fn push_status_to_mirror(&self, ride: &Ride, report: &mut ReconcileReport) {
        let mut partial = route_fields(ride);
        partial.insert("status".to_string(), Value::from(ride.status.as_str()));
        if let Some(at) = ride.completed_at {
            partial.insert("completedAt".to_string(), Value::from(at.timestamp_millis()));
        }
        self.patch_mirror(ride, partial, report).await;
    }

    async fn patch_mirror(&self, ride: &Ride, partial: Map<String, Value>, report: &mut ReconcileReport) {
        match self.mirror.update(active_ride_path(&ride.id), partial).await {
            Ok(()) => {
                info!(ride_id = %ride.id, "Live copy repaired from ride record");
                report.mirror_repaired.push(ride.id.clone());
            }
            Err(e) => {
                error!(ride_id = %ride.id, error = %e, "Live copy repair failed");
                report.failures += 1;
            }
        }
    }

    async fn push_status_to_durable(&self, ride: &Ride, status: RideStatus, report: &mut ReconcileReport) {
        let patch = RidePatch {
            status: Some(status),
            stamp_completed_at: status == RideStatus::Completed,
            ..RidePatch::default()
        };
        match self.rides.update(ride.id.clone(), patch).await {
            Ok(_) => {
                info!(ride_id = %ride.id, status = %status, "Ride record repaired from live copy");
                report.durable_repaired.push(ride.id.clone());
            }
            Err(e) => {
                error!(ride_id = %ride.id, error = %e, "Ride record repair failed");
                report.failures += 1;
            }
        }
    }
}

/// Route, fare and identity fields of the live copy, taken from the record.
fn route_fields(ride: &Ride) -> Map<String, Value> {
    let snapshot = RideSnapshot::from_ride(ride, ride.created_at.timestamp_millis());
    let mut fields = match snapshot.to_value() {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    };
    for key in ["status", "createdAt", "completedAt", "driver", "driverLocation"] {
        fields.remove(key);
    }
    fields
}
