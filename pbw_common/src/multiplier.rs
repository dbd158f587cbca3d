use std::fmt::Display;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------    PriceMultiplier    -------------------------------------------------------

/// A per-customer price scaling factor, stored in basis points of unity (10,000 = 1.0).
///
/// Every construction path enforces the allowed range of 0.5 to 20.0 inclusive, so a value of this type is always
/// safe to apply to a price. The fixed-point representation keeps the column an integer in the database and avoids
/// re-validating on every read.
#[derive(Debug, Clone, Copy, Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct PriceMultiplier(i64);

#[derive(Debug, Clone, Error)]
#[error("price multiplier {0} is outside the allowed range of 0.5 to 20.0")]
pub struct MultiplierRangeError(pub String);

impl PriceMultiplier {
    pub const IDENTITY: PriceMultiplier = PriceMultiplier(10_000);
    pub const MAX: PriceMultiplier = PriceMultiplier(200_000);
    pub const MIN: PriceMultiplier = PriceMultiplier(5_000);

    pub fn new(basis_points: i64) -> Result<Self, MultiplierRangeError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&basis_points) {
            Ok(Self(basis_points))
        } else {
            Err(MultiplierRangeError(Decimal::new(basis_points, 4).normalize().to_string()))
        }
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 4)
    }
}

impl Default for PriceMultiplier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<Decimal> for PriceMultiplier {
    type Error = MultiplierRangeError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let basis_points = value * Decimal::from(10_000);
        if basis_points.fract() != Decimal::ZERO {
            return Err(MultiplierRangeError(format!("{value} (more than 4 decimal places)")));
        }
        let basis_points = basis_points.to_i64().ok_or_else(|| MultiplierRangeError(value.to_string()))?;
        Self::new(basis_points)
    }
}

impl Display for PriceMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}

impl Serialize for PriceMultiplier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        Serialize::serialize(&self.to_decimal().normalize(), serializer)
    }
}

impl<'de> Deserialize<'de> for PriceMultiplier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        PriceMultiplier::try_from(value).map_err(serde::de::Error::custom)
    }
}
