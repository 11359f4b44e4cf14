//! Realtime mirror: a low-latency JSON tree keyed by path, with push
//! subscriptions on individual paths.

mod actor;
pub mod error;

pub use actor::*;
pub use error::*;

/// Path of the live record for a ride.
pub fn active_ride_path(ride_id: &str) -> String {
    format!("{}/{}", ACTIVE_RIDES, ride_id)
}

/// Root under which live ride records are kept.
pub const ACTIVE_RIDES: &str = "activeRides";
