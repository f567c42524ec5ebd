//! Money and rate value objects.
//!
//! All monetary values are whole cents in an `i64`; rates are basis points.
//! No floating point is involved anywhere on the commission path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use super::ValidationError;

const BASIS_POINTS_PER_UNIT: i128 = 10_000;

/// An amount of US dollars, stored as cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Creates an amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole dollars.
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Applies a rate, rounding half away from zero to the nearest cent.
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let product = i128::from(self.0) * i128::from(rate.basis_points());
        let half = BASIS_POINTS_PER_UNIT / 2;
        let rounded = if product >= 0 {
            (product + half) / BASIS_POINTS_PER_UNIT
        } else {
            (product - half) / BASIS_POINTS_PER_UNIT
        };
        // A rate never exceeds 100%, so the result always fits back into i64.
        Money(rounded as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}.{:02}", sign, grouped, cents)
    }
}

/// A proportional rate expressed in basis points (1% = 100 bps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Rate(u32);

impl Rate {
    /// Upper bound: 100%.
    pub const MAX_BASIS_POINTS: u32 = 10_000;

    /// Creates a rate, clamping to 100%.
    pub const fn new(bps: u32) -> Self {
        if bps > Self::MAX_BASIS_POINTS {
            Self(Self::MAX_BASIS_POINTS)
        } else {
            Self(bps)
        }
    }

    /// Creates a rate from basis points, rejecting anything above 100%.
    pub fn from_basis_points(bps: u32) -> Result<Self, ValidationError> {
        if bps > Self::MAX_BASIS_POINTS {
            return Err(ValidationError::out_of_range(
                "rate_bps",
                0,
                Self::MAX_BASIS_POINTS as i32,
                bps as i32,
            ));
        }
        Ok(Self(bps))
    }

    /// Creates a rate from a whole percentage.
    pub fn from_percent(percent: u32) -> Result<Self, ValidationError> {
        Self::from_basis_points(percent.saturating_mul(100))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Rate {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_basis_points(value)
    }
}

impl From<Rate> for u32 {
    fn from(value: Rate) -> Self {
        value.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
