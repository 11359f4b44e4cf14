use chrono::{DateTime, Utc};

use crate::actor_framework::Entity;
use crate::domain::{RiderCreate, RiderPatch, RiderProfile};

impl Entity for RiderProfile {
    type Id = String;
    type CreatePayload = RiderCreate;
    type Patch = RiderPatch;
    type Filter = ();
    type SortKey = DateTime<Utc>;

    const COLLECTION: &'static str = "riders";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(id: String, payload: RiderCreate, now: DateTime<Utc>) -> Result<Self, String> {
        Ok(Self {
            id,
            name: payload.name,
            phone_number: payload.phone_number,
            email: None,
            created_at: now,
            updated_at: None,
            total_rides: 0,
        })
    }

    /// Updates name and/or email and stamps `updatedAt`.
    fn on_update(&mut self, patch: RiderPatch, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = Some(email);
        }
        self.updated_at = Some(now);
        Ok(())
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
