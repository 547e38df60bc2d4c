use std::fmt::Display;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

/// The number of basis points in 100%
pub const BASIS_POINTS: i64 = 10_000;

/// A percentage rate (commission, VAT, gateway fee) held as integer basis points.
///
/// In JSON a rate is a fraction, so `0.15` is 15%.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Rate(i64);

#[derive(Debug, Clone, Error)]
#[error("Invalid rate: {0}")]
pub struct RateConversionError(String);

impl Rate {
    pub const fn from_bps(bps: i64) -> Self {
        Self(bps)
    }

    pub fn bps(&self) -> i64 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / BASIS_POINTS as f64
    }
}

impl TryFrom<f64> for Rate {
    type Error = RateConversionError;

    fn try_from(fraction: f64) -> Result<Self, Self::Error> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(RateConversionError(format!("{fraction} is not between 0 and 1")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self((fraction * BASIS_POINTS as f64).round() as i64))
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_fraction())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fraction = f64::deserialize(deserializer)?;
        Rate::try_from(fraction).map_err(D::Error::custom)
    }
}
