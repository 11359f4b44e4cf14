use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Centre of the default map region, used when the device has no fix.
pub const DEFAULT_REGION: Coordinate = Coordinate {
    latitude: 24.7136,
    longitude: 46.6753,
};

/// Source of the device position.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Option<Coordinate>;

    /// The current position, or [`DEFAULT_REGION`] when none is available.
    fn pickup_location(&self) -> Coordinate {
        self.current_location().unwrap_or(DEFAULT_REGION)
    }
}

/// Provider that always reports the same position (or none).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinate>);

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> Option<Coordinate> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_back_to_default_region() {
        assert_eq!(FixedLocation(None).pickup_location(), DEFAULT_REGION);

        let here = Coordinate::new(21.5433, 39.1728);
        assert_eq!(FixedLocation(Some(here)).pickup_location(), here);
    }
}
