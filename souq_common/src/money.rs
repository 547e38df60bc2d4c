use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
    str::FromStr,
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::{op, Rate, BASIS_POINTS};

/// Integer division that rounds halves away from zero.
///
/// For the non-negative amounts that make up almost all marketplace arithmetic this is plain round-half-up. Rounding
/// symmetrically around zero means `round(-x) == -round(x)`, so negated (reversal) figures always cancel exactly.
///
/// Every rounded money computation in the workspace goes through this function.
pub fn round_half_away(numerator: i128, denominator: i128) -> i64 {
    debug_assert!(denominator != 0, "round_half_away called with a zero denominator");
    if denominator == 0 {
        return 0;
    }
    let (n, d) = if denominator < 0 { (-numerator, -denominator) } else { (numerator, denominator) };
    let quotient = n / d;
    let remainder = n % d;
    let adjust = if 2 * remainder.abs() >= d { n.signum() } else { 0 };
    let v = quotient + adjust;
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}

//--------------------------------------       Money        ---------------------------------------------------------
/// A monetary amount, stored as an integer number of minor units (cents).
///
/// JSON representations use decimal major units (`12.5` is 1250 cents). The database stores the integer directly.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(major: f64) -> Result<Self, Self::Error> {
        let cents = (major * 100.0).round();
        if !cents.is_finite() || cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return Err(MoneyConversionError(format!("{major} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().parse::<f64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))?;
        Self::try_from(v)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Money::try_from(major).map_err(D::Error::custom)
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole major units, e.g. `Money::from_major(10)` is 10.00
    pub fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    /// The amount in minor units. This is the figure payment gateways expect.
    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `None` if the sum does not fit in the cent range
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Money> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// `self × rate`, rounded to the nearest cent.
    pub fn apply_rate(&self, rate: Rate) -> Self {
        Self(round_half_away(i128::from(self.0) * i128::from(rate.bps()), i128::from(BASIS_POINTS)))
    }

    /// Splits this amount into parts proportional to `weights`. The parts always sum to exactly `self`; the rounding
    /// remainder lands on the last part. If every weight is zero, the last part receives everything.
    pub fn allocate(&self, weights: &[Money]) -> Vec<Money> {
        let Some(last) = weights.len().checked_sub(1) else {
            return Vec::new();
        };
        let total_weight = weights.iter().map(|w| i128::from(w.0)).sum::<i128>();
        let mut remaining = *self;
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                if i == last {
                    return remaining;
                }
                let share = match total_weight {
                    0 => Money::ZERO,
                    t => Money(round_half_away(i128::from(self.0) * i128::from(w.0), t)),
                };
                remaining -= share;
                share
            })
            .collect()
    }

    pub fn max_zero(self) -> Self {
        self.max(Money::ZERO)
    }
}
