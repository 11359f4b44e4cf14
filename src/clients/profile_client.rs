use tracing::{debug, info, instrument};

use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{RiderCreate, RiderPatch, RiderProfile, Session};
use crate::rider_actor::ProfileError;

/// Client for rider profiles in the `riders` collection.
#[derive(Clone)]
pub struct ProfileClient {
    riders: ResourceClient<RiderProfile>,
    country_code: String,
}

impl_client_methods!(ProfileClient, riders: RiderProfile, ProfileError, rider);

impl ProfileClient {
    pub fn new(riders: ResourceClient<RiderProfile>, country_code: impl Into<String>) -> Self {
        Self {
            riders,
            country_code: country_code.into(),
        }
    }

    /// Prefix a local number with the configured country code. Numbers that
    /// already carry a `+` are kept as they are.
    pub fn normalize_phone(&self, number: &str) -> String {
        let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.starts_with('+') {
            return digits;
        }
        format!("{}{}", self.country_code, digits.trim_start_matches('0'))
    }

    /// Write the profile for a freshly verified rider.
    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn register_rider(&self, session: &Session, name: String) -> Result<RiderProfile, ProfileError> {
        debug!("Sending request");
        let name = required_name(name)?;
        let payload = RiderCreate {
            name,
            phone_number: self.normalize_phone(&session.phone_number),
        };
        self.riders
            .insert(session.rider_id.clone(), payload)
            .await
            .map_err(|e| ProfileError::ActorCommunicationError(e.to_string()))?;
        info!("Rider registered");
        self.get_profile(session).await
    }

    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn get_profile(&self, session: &Session) -> Result<RiderProfile, ProfileError> {
        self.get_rider(session.rider_id.clone())
            .await?
            .ok_or_else(|| ProfileError::NotFound(session.rider_id.clone()))
    }

    /// Change name and email. An empty email leaves the stored one alone.
    #[instrument(skip(self, session), fields(rider_id = %session.rider_id))]
    pub async fn update_profile(
        &self,
        session: &Session,
        name: String,
        email: Option<String>,
    ) -> Result<RiderProfile, ProfileError> {
        debug!("Sending request");
        let patch = RiderPatch {
            name: Some(required_name(name)?),
            email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        };
        self.riders
            .update(session.rider_id.clone(), patch)
            .await
            .map_err(|e| match e {
                FrameworkError::NotFound(id) => ProfileError::NotFound(id),
                other => ProfileError::ActorCommunicationError(other.to_string()),
            })
    }
}

fn required_name(name: String) -> Result<String, ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::ValidationError("name is required".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::create_mock_client;

    #[test]
    fn test_normalize_phone() {
        let (riders, _receiver) = create_mock_client::<RiderProfile>(1);
        let client = ProfileClient::new(riders, "+966");

        assert_eq!(client.normalize_phone("050 123 4567"), "+966501234567");
        assert_eq!(client.normalize_phone("501234567"), "+966501234567");
        assert_eq!(client.normalize_phone("+44 20 7946 0000"), "+442079460000");
    }
}
