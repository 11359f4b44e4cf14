//! Mock fare estimate shown on the booking form.
//!
//! There is no routing, so the trip distance is drawn at random; the fare is
//! the class tariff applied to that distance.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::VehicleClass;

/// Shortest mock trip, in kilometres.
pub const MIN_DISTANCE_KM: f64 = 2.0;
/// Longest mock trip (exclusive), in kilometres.
pub const MAX_DISTANCE_KM: f64 = 12.0;

/// `round(base + distance_km * per_km)` for the given class.
pub fn estimate_fare(class: VehicleClass, distance_km: f64) -> u32 {
    let tariff = class.tariff();
    let fare = f64::from(tariff.base_rate) + distance_km.max(0.0) * f64::from(tariff.per_km);
    fare.round() as u32
}

pub struct FareEstimator<R: Rng = SmallRng> {
    rng: R,
}

impl FareEstimator<SmallRng> {
    pub fn new() -> Self {
        Self { rng: SmallRng::from_entropy() }
    }
}

impl Default for FareEstimator<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FareEstimator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn estimate(&mut self, class: VehicleClass) -> u32 {
        let distance_km = self.rng.gen_range(MIN_DISTANCE_KM..MAX_DISTANCE_KM);
        estimate_fare(class, distance_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tariff_formula() {
        assert_eq!(estimate_fare(VehicleClass::Standard, 7.0), 24);
        assert_eq!(estimate_fare(VehicleClass::Comfort, 2.5), 23);
        assert_eq!(estimate_fare(VehicleClass::Premium, 10.0), 75);
    }

    #[test]
    fn test_estimates_stay_in_class_range() {
        let mut estimator = FareEstimator::with_rng(SmallRng::seed_from_u64(7));
        for class in VehicleClass::ALL {
            let tariff = class.tariff();
            let low = tariff.base_rate + 2 * tariff.per_km;
            let high = tariff.base_rate + 12 * tariff.per_km;
            for _ in 0..100 {
                let fare = estimator.estimate(class);
                assert!((low..=high).contains(&fare), "{class}: {fare}");
            }
        }
    }
}
