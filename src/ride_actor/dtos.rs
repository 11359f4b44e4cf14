use crate::domain::{Coordinate, Driver, RideStatus, VehicleClass};

/// Payload for writing a new ride record. Validation happens before this
/// is built.
#[derive(Debug, Clone)]
pub struct RideCreate {
    pub rider_id: String,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleClass,
    pub estimated_fare: u32,
    pub pickup_location: Coordinate,
}

/// Partial update of a ride record.
#[derive(Debug, Clone, Default)]
pub struct RidePatch {
    pub status: Option<RideStatus>,
    /// Stamp `completedAt` with the store's clock (only if unset).
    pub stamp_completed_at: bool,
    pub driver: Option<Driver>,
    pub driver_location: Option<Coordinate>,
}

impl RidePatch {
    pub fn status(status: RideStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            status: Some(RideStatus::Completed),
            stamp_completed_at: true,
            ..Self::default()
        }
    }
}

/// Which rides a history query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideFilter {
    All,
    Rider(String),
}
