use thiserror::Error;

use crate::domain::RideStatus;

/// Errors that can occur during ride operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RideError {
    #[error("Ride validation error: {0}")]
    ValidationError(String),
    #[error("Ride not found: {0}")]
    NotFound(String),
    #[error("Ride {ride_id} belongs to another rider")]
    NotOwner { ride_id: String },
    #[error("Cannot {action} ride {ride_id} while it is {status}")]
    InvalidTransition {
        ride_id: String,
        status: RideStatus,
        action: &'static str,
    },
    #[error("Ride record write failed: {0}")]
    DurableWriteError(String),
    #[error("Live ride write failed: {0}")]
    MirrorWriteError(String),
    #[error("Live ride could not be decoded: {0}")]
    DecodeError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl RideError {
    /// The static message shown to the rider. Failures are not told apart
    /// beyond validation problems.
    pub fn user_message(&self) -> &'static str {
        match self {
            RideError::ValidationError(_) => "Please enter pickup and destination",
            RideError::InvalidTransition { .. } => "This ride can no longer be changed",
            _ => "Something went wrong, please try again",
        }
    }
}
