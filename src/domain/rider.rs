use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rider's profile, keyed by the rider id from the auth session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderProfile {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub total_rides: u32,
}

/// Payload for registering a rider.
#[derive(Debug, Clone)]
pub struct RiderCreate {
    pub name: String,
    pub phone_number: String,
}

/// Payload for editing a profile.
#[derive(Debug, Clone, Default)]
pub struct RiderPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}
