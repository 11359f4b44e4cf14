use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Vehicle classes a rider can book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Standard,
    Comfort,
    Premium,
}

/// Base fare and per-kilometre rate, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tariff {
    pub base_rate: u32,
    pub per_km: u32,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Standard, VehicleClass::Comfort, VehicleClass::Premium];

    pub fn tag(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "standard",
            VehicleClass::Comfort => "comfort",
            VehicleClass::Premium => "premium",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "Standard",
            VehicleClass::Comfort => "Comfort",
            VehicleClass::Premium => "Premium",
        }
    }

    pub fn tariff(&self) -> Tariff {
        match self {
            VehicleClass::Standard => Tariff { base_rate: 10, per_km: 2 },
            VehicleClass::Comfort => Tariff { base_rate: 15, per_km: 3 },
            VehicleClass::Premium => Tariff { base_rate: 25, per_km: 5 },
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown vehicle class: {0}")]
pub struct UnknownVehicleClass(pub String);

impl FromStr for VehicleClass {
    type Err = UnknownVehicleClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleClass::ALL
            .into_iter()
            .find(|class| class.tag() == s)
            .ok_or_else(|| UnknownVehicleClass(s.to_string()))
    }
}
