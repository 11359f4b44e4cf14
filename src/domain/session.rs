/// Identity of the signed-in rider, passed explicitly into every call that
/// acts on the rider's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub rider_id: String,
    pub phone_number: String,
}

impl Session {
    pub fn new(rider_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            rider_id: rider_id.into(),
            phone_number: phone_number.into(),
        }
    }
}
