use chrono::{DateTime, Utc};

use super::dtos::{RideCreate, RideFilter, RidePatch};
use crate::actor_framework::Entity;
use crate::domain::{PaymentMethod, Ride, RideStatus};

impl Entity for Ride {
    type Id = String;
    type CreatePayload = RideCreate;
    type Patch = RidePatch;
    type Filter = RideFilter;
    type SortKey = DateTime<Utc>;

    const COLLECTION: &'static str = "rides";

    fn id(&self) -> &String {
        &self.id
    }

    /// New rides always start out `searching`, paid in cash.
    fn from_create(id: String, payload: RideCreate, now: DateTime<Utc>) -> Result<Self, String> {
        Ok(Self {
            id,
            rider_id: payload.rider_id,
            pickup: payload.pickup,
            destination: payload.destination,
            vehicle_type: payload.vehicle_type,
            estimated_fare: payload.estimated_fare,
            payment_method: PaymentMethod::Cash,
            pickup_location: payload.pickup_location,
            status: RideStatus::Searching,
            created_at: now,
            completed_at: None,
            driver: None,
            driver_location: None,
        })
    }

    /// Applies a partial update.
    ///
    /// # Errors
    /// Rejects any status change once the ride is terminal, and any move to
    /// `cancelled` or `completed` the rider could not have made from the
    /// current status (see [`RideStatus::can_become`]).
    fn on_update(&mut self, patch: RidePatch, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(status) = patch.status {
            if !self.status.can_become(status) {
                return Err(format!(
                    "ride {} is already {}, cannot move to {}",
                    self.id, self.status, status
                ));
            }
            self.status = status;
        }
        if patch.stamp_completed_at && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        if let Some(driver) = patch.driver {
            self.driver = Some(driver);
        }
        if let Some(location) = patch.driver_location {
            self.driver_location = Some(location);
        }
        Ok(())
    }

    fn matches(&self, filter: &RideFilter) -> bool {
        match filter {
            RideFilter::All => true,
            RideFilter::Rider(rider_id) => &self.rider_id == rider_id,
        }
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, VehicleClass};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn new_ride() -> Ride {
        let payload = RideCreate {
            rider_id: "rider_1".into(),
            pickup: "Tahlia St".into(),
            destination: "King Fahd Rd".into(),
            vehicle_type: VehicleClass::Standard,
            estimated_fare: 24,
            pickup_location: Coordinate::new(24.7, 46.6),
        };
        Ride::from_create("r1".into(), payload, at(100)).unwrap()
    }

    #[test]
    fn test_new_ride_is_searching() {
        let ride = new_ride();
        assert_eq!(ride.status, RideStatus::Searching);
        assert_eq!(ride.payment_method, PaymentMethod::Cash);
        assert_eq!(ride.created_at, at(100));
    }

    #[test]
    fn test_completed_at_is_stamped_once() {
        let mut ride = new_ride();
        ride.on_update(RidePatch::status(RideStatus::Started), at(200)).unwrap();
        ride.on_update(RidePatch::completed(), at(300)).unwrap();
        assert_eq!(ride.completed_at, Some(at(300)));

        let again = ride.on_update(RidePatch::completed(), at(400));
        assert!(again.is_err());
        assert_eq!(ride.completed_at, Some(at(300)));
    }

    #[test]
    fn test_terminal_status_never_regresses() {
        let mut ride = new_ride();
        ride.on_update(RidePatch::status(RideStatus::Cancelled), at(200)).unwrap();
        assert!(ride.on_update(RidePatch::status(RideStatus::Accepted), at(300)).is_err());
        assert_eq!(ride.status, RideStatus::Cancelled);
    }

    #[test]
    fn test_rider_transitions_enforced_on_record() {
        let mut ride = new_ride();
        assert!(ride.on_update(RidePatch::completed(), at(150)).is_err());
        assert_eq!(ride.completed_at, None);

        ride.on_update(RidePatch::status(RideStatus::Accepted), at(200)).unwrap();
        ride.on_update(RidePatch::status(RideStatus::Started), at(300)).unwrap();
        assert!(ride.on_update(RidePatch::status(RideStatus::Cancelled), at(400)).is_err());
        assert_eq!(ride.status, RideStatus::Started);
    }

    #[test]
    fn test_filter_by_rider() {
        let ride = new_ride();
        assert!(ride.matches(&RideFilter::All));
        assert!(ride.matches(&RideFilter::Rider("rider_1".into())));
        assert!(!ride.matches(&RideFilter::Rider("rider_2".into())));
    }
}
