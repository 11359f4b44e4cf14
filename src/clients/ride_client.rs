use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::subscription::SubscriptionHandle;
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{
    Coordinate, PaymentMethod, Ride, RideAction, RideSnapshot, RideStatus, Session, VehicleClass,
};
use crate::mirror::{active_ride_path, MirrorClient, MirrorError};
use crate::ride_actor::{RideCreate, RideError, RideFilter, RidePatch};

/// What the rider entered on the booking form.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub pickup: String,
    pub destination: String,
    /// Vehicle class tag as chosen in the form, e.g. `"standard"`.
    pub vehicle_class: String,
    pub estimated_fare: u32,
    pub pickup_location: Coordinate,
}

impl BookingRequest {
    pub fn new(
        pickup: impl Into<String>,
        destination: impl Into<String>,
        vehicle_class: impl Into<String>,
        estimated_fare: u32,
        pickup_location: Coordinate,
    ) -> Self {
        Self {
            pickup: pickup.into(),
            destination: destination.into(),
            vehicle_class: vehicle_class.into(),
            estimated_fare,
            pickup_location,
        }
    }

    /// Check the form and turn it into a store payload for `rider_id`.
    pub fn validate(self, rider_id: &str) -> Result<RideCreate, RideError> {
        let pickup = self.pickup.trim();
        let destination = self.destination.trim();
        if pickup.is_empty() || destination.is_empty() {
            return Err(RideError::ValidationError(
                "pickup and destination are required".to_string(),
            ));
        }
        let vehicle_type = self
            .vehicle_class
            .parse::<VehicleClass>()
            .map_err(|e| RideError::ValidationError(e.to_string()))?;

        Ok(RideCreate {
            rider_id: rider_id.to_string(),
            pickup: pickup.to_string(),
            destination: destination.to_string(),
            vehicle_type,
            estimated_fare: self.estimated_fare,
            pickup_location: self.pickup_location,
        })
    }
}

/// Keeps a ride consistent between the durable record and its live mirror.
///
/// Creation writes the durable record first, then the mirror. Rider-initiated
/// transitions write the mirror first, then the durable record. Neither pair
/// is transactional; [`crate::app_system::Reconciler`] repairs drift.
#[derive(Clone)]
pub struct RideLifecycleSync {
    rides: ResourceClient<Ride>,
    mirror: MirrorClient,
}

impl RideLifecycleSync {
    pub fn new(rides: ResourceClient<Ride>, mirror: MirrorClient) -> Self {
        Self { rides, mirror }
    }

    /// Book a ride. Returns the new ride id.
    ///
    /// # Errors
    /// `ValidationError` before any write; `DurableWriteError` if the record
    /// could not be created; `MirrorWriteError` if the record exists but the
    /// live copy could not be written (left for the reconciler).
    #[instrument(skip(self, session, request), fields(rider_id = %session.rider_id))]
    pub async fn create_ride(&self, session: &Session, request: BookingRequest) -> Result<String, RideError> {
        info!("Processing create_ride request");
        let payload = request.validate(&session.rider_id)?;

        let ride_id = self
            .rides
            .create(payload.clone())
            .await
            .map_err(|e| RideError::DurableWriteError(e.to_string()))?;
        debug!(ride_id = %ride_id, "Ride record written");

        let snapshot = initial_snapshot(&ride_id, payload, Utc::now().timestamp_millis());
        let value = snapshot
            .to_value()
            .map_err(|e| RideError::MirrorWriteError(e.to_string()))?;
        if let Err(e) = self.mirror.set(active_ride_path(&ride_id), value).await {
            error!(ride_id = %ride_id, error = %e, "Ride record written but live copy failed");
            return Err(RideError::MirrorWriteError(e.to_string()));
        }

        info!(ride_id = %ride_id, "Ride created");
        Ok(ride_id)
    }

    /// Listen to the live copy of a ride. `on_update` receives the full
    /// record after every write, in the mirror's write order, until the
    /// handle is unsubscribed or dropped.
    #[instrument(skip(self, on_update))]
    pub async fn subscribe<F>(&self, ride_id: String, on_update: F) -> Result<SubscriptionHandle, RideError>
    where
        F: FnMut(RideSnapshot) + Send + 'static,
    {
        debug!("Sending request");
        let subscription = self
            .mirror
            .subscribe(active_ride_path(&ride_id))
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))?;
        Ok(SubscriptionHandle::spawn(ride_id, self.mirror.clone(), subscription, on_update))
    }

    /// Current live copy, used to draw the tracking view before any push.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, ride_id: String) -> Result<Option<RideSnapshot>, RideError> {
        debug!("Sending request");
        let value = self
            .mirror
            .get(active_ride_path(&ride_id))
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))?;
        value
            .map(RideSnapshot::from_value)
            .transpose()
            .map_err(|e| RideError::DecodeError(e.to_string()))
    }

    /// Cancel a ride that is still `searching` or `accepted`.
    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn cancel(&self, session: &Session, ride_id: String) -> Result<Ride, RideError> {
        info!("Processing cancel request");
        self.check_rider_action(session, &ride_id, RideAction::Cancel).await?;

        let mut partial = Map::new();
        partial.insert("status".to_string(), Value::from(RideStatus::Cancelled.as_str()));
        self.write_both(ride_id, partial, RidePatch::status(RideStatus::Cancelled))
            .await
    }

    /// Complete a ride that is `started`, stamping the completion time in
    /// each store's own clock.
    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn complete(&self, session: &Session, ride_id: String) -> Result<Ride, RideError> {
        info!("Processing complete request");
        self.check_rider_action(session, &ride_id, RideAction::Complete).await?;

        let mut partial = Map::new();
        partial.insert("status".to_string(), Value::from(RideStatus::Completed.as_str()));
        partial.insert("completedAt".to_string(), Value::from(Utc::now().timestamp_millis()));
        self.write_both(ride_id, partial, RidePatch::completed()).await
    }

    /// The rider's rides, newest first, at most `limit` of them.
    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn list_history(&self, session: &Session, limit: usize) -> Result<Vec<Ride>, RideError> {
        debug!("Sending request");
        self.rides
            .query(RideFilter::Rider(session.rider_id.clone()), limit)
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))
    }

    /// Load the durable record, confirm ownership and confirm `action` is
    /// allowed.
    ///
    /// Either store may be a step ahead of the other, so the action has to
    /// be allowed by both the durable status and the live status. The live
    /// copy is skipped when it is missing or unreadable.
    async fn check_rider_action(&self, session: &Session, ride_id: &str, action: RideAction) -> Result<(), RideError> {
        let ride = self
            .get_ride(ride_id.to_string())
            .await?
            .ok_or_else(|| RideError::NotFound(ride_id.to_string()))?;
        if ride.rider_id != session.rider_id {
            warn!(ride_id = %ride_id, "Rider does not own this ride");
            return Err(RideError::NotOwner { ride_id: ride_id.to_string() });
        }

        let mut blocking = (!ride.status.permits(action)).then_some(ride.status);
        if blocking.is_none() {
            match self.snapshot(ride_id.to_string()).await {
                Ok(Some(live)) if !live.status.permits(action) => blocking = Some(live.status),
                Ok(_) => {}
                Err(e) => warn!(ride_id = %ride_id, error = %e, "Live copy unreadable, using ride record"),
            }
        }

        if let Some(status) = blocking {
            let action = match action {
                RideAction::Cancel => "cancel",
                RideAction::Complete => "complete",
            };
            warn!(ride_id = %ride_id, status = %status, action, "Transition rejected");
            return Err(RideError::InvalidTransition {
                ride_id: ride_id.to_string(),
                status,
                action,
            });
        }
        Ok(())
    }

    /// Issue the mirror write, then the durable write. Both are attempted
    /// even if the first fails.
    async fn write_both(&self, ride_id: String, partial: Map<String, Value>, patch: RidePatch) -> Result<Ride, RideError> {
        let mirror_result = self.mirror.update(active_ride_path(&ride_id), partial).await;
        if let Err(e) = &mirror_result {
            error!(ride_id = %ride_id, error = %e, "Live copy update failed");
        }

        let target = patch.status;
        let durable_result = self.rides.update(ride_id.clone(), patch).await;
        let ride = match durable_result {
            Ok(ride) => ride,
            Err(e @ FrameworkError::Rejected(_)) => match self.already_in(&ride_id, target).await {
                // Someone else (usually the reconciler) finished the same write first.
                Some(ride) => {
                    debug!(ride_id = %ride_id, status = %ride.status, "Ride record already updated");
                    ride
                }
                None => {
                    error!(ride_id = %ride_id, error = %e, "Ride record update rejected");
                    return Err(RideError::DurableWriteError(e.to_string()));
                }
            },
            Err(e) => {
                error!(ride_id = %ride_id, error = %e, "Ride record update failed");
                return Err(RideError::DurableWriteError(e.to_string()));
            }
        };

        match mirror_result {
            Ok(()) => {
                info!(ride_id = %ride_id, status = %ride.status, "Ride updated");
                Ok(ride)
            }
            Err(MirrorError::NotFound(path)) => Err(RideError::MirrorWriteError(format!("no live copy at {}", path))),
            Err(e) => Err(RideError::MirrorWriteError(e.to_string())),
        }
    }

    /// The durable record, if it already holds `target`.
    async fn already_in(&self, ride_id: &str, target: Option<RideStatus>) -> Option<Ride> {
        let target = target?;
        match self.rides.get(ride_id.to_string()).await {
            Ok(Some(ride)) if ride.status == target => Some(ride),
            _ => None,
        }
    }
}

impl_client_methods!(RideLifecycleSync, rides: Ride, RideError, ride);

/// The live copy written at booking time, before any matching has happened.
fn initial_snapshot(ride_id: &str, payload: RideCreate, observed_at_ms: i64) -> RideSnapshot {
    RideSnapshot {
        ride_id: ride_id.to_string(),
        rider_id: payload.rider_id,
        pickup: payload.pickup,
        destination: payload.destination,
        vehicle_type: payload.vehicle_type,
        estimated_fare: payload.estimated_fare,
        payment_method: PaymentMethod::Cash,
        pickup_location: payload.pickup_location,
        status: RideStatus::Searching,
        created_at: observed_at_ms,
        completed_at: None,
        driver: None,
        driver_location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_REGION;

    fn form(pickup: &str, destination: &str, class: &str) -> BookingRequest {
        BookingRequest::new(pickup, destination, class, 24, DEFAULT_REGION)
    }

    #[test]
    fn test_validation_trims_and_parses() {
        let payload = form("  Tahlia St ", "King Fahd Rd", "standard").validate("rider_1").unwrap();
        assert_eq!(payload.pickup, "Tahlia St");
        assert_eq!(payload.vehicle_type, VehicleClass::Standard);
        assert_eq!(payload.rider_id, "rider_1");
    }

    #[test]
    fn test_validation_failures() {
        for request in [
            form("", "King Fahd Rd", "standard"),
            form("Tahlia St", "   ", "standard"),
            form("Tahlia St", "King Fahd Rd", "helicopter"),
        ] {
            let result = request.validate("rider_1");
            assert!(matches!(result, Err(RideError::ValidationError(_))), "{result:?}");
        }
    }
}
