use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Coordinate, RideStatus, VehicleClass};

/// How the rider pays. Only cash is offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
}

/// Driver details, filled in by the matching process on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    pub vehicle: String,
    pub plate_number: String,
}

/// The durable ride record, the system of truth for history.
///
/// Field names serialize in camelCase; the matching process reads and
/// writes the same names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub rider_id: String,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleClass,
    pub estimated_fare: u32,
    pub payment_method: PaymentMethod,
    pub pickup_location: Coordinate,
    pub status: RideStatus,
    /// Assigned by the store when the record is written.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_location: Option<Coordinate>,
}

/// The live copy of a ride kept in the realtime mirror under
/// `activeRides/{rideId}`. Timestamps are epoch milliseconds observed by the
/// writing client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSnapshot {
    pub ride_id: String,
    pub rider_id: String,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleClass,
    pub estimated_fare: u32,
    pub payment_method: PaymentMethod,
    pub pickup_location: Coordinate,
    pub status: RideStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_location: Option<Coordinate>,
}

impl RideSnapshot {
    /// Mirror a durable record. `observed_at_ms` becomes the mirror's
    /// `createdAt`.
    pub fn from_ride(ride: &Ride, observed_at_ms: i64) -> Self {
        Self {
            ride_id: ride.id.clone(),
            rider_id: ride.rider_id.clone(),
            pickup: ride.pickup.clone(),
            destination: ride.destination.clone(),
            vehicle_type: ride.vehicle_type,
            estimated_fare: ride.estimated_fare,
            payment_method: ride.payment_method,
            pickup_location: ride.pickup_location,
            status: ride.status,
            created_at: observed_at_ms,
            completed_at: ride.completed_at.map(|at| at.timestamp_millis()),
            driver: ride.driver.clone(),
            driver_location: ride.driver_location,
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// True when both copies agree on identity, status, route and fare.
    pub fn agrees_with(&self, ride: &Ride) -> bool {
        self.ride_id == ride.id
            && self.rider_id == ride.rider_id
            && self.status == ride.status
            && self.pickup == ride.pickup
            && self.destination == ride.destination
            && self.vehicle_type == ride.vehicle_type
            && self.estimated_fare == ride.estimated_fare
            && self.payment_method == ride.payment_method
            && self.pickup_location == ride.pickup_location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ride() -> Ride {
        Ride {
            id: "r1".into(),
            rider_id: "rider_1".into(),
            pickup: "Tahlia St".into(),
            destination: "King Fahd Rd".into(),
            vehicle_type: VehicleClass::Standard,
            estimated_fare: 24,
            payment_method: PaymentMethod::Cash,
            pickup_location: Coordinate::new(24.7, 46.6),
            status: RideStatus::Searching,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            completed_at: None,
            driver: None,
            driver_location: None,
        }
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = RideSnapshot::from_ride(&ride(), 1_700_000_000_123);
        let value = snapshot.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "rideId": "r1",
                "riderId": "rider_1",
                "pickup": "Tahlia St",
                "destination": "King Fahd Rd",
                "vehicleType": "standard",
                "estimatedFare": 24,
                "paymentMethod": "cash",
                "pickupLocation": {"latitude": 24.7, "longitude": 46.6},
                "status": "searching",
                "createdAt": 1_700_000_000_123_i64,
            })
        );
        assert!(snapshot.agrees_with(&ride()));
    }

    #[test]
    fn test_snapshot_accepts_fields_from_matching_process() {
        let mut value = RideSnapshot::from_ride(&ride(), 1).to_value().unwrap();
        value["status"] = json!("accepted");
        value["driver"] = json!({"name": "Saad", "vehicle": "Camry", "plateNumber": "ABC 123"});
        value["driverLocation"] = json!({"latitude": 24.71, "longitude": 46.67});

        let snapshot = RideSnapshot::from_value(value).unwrap();
        assert_eq!(snapshot.status, RideStatus::Accepted);
        assert_eq!(snapshot.driver.unwrap().plate_number, "ABC 123");
        assert!(snapshot.driver_location.is_some());
    }
}
