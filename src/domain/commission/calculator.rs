//! CommissionCalculator - partner tier and deal value to commission.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Money, Rate, ValidationError};

/// Reseller partner programme level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerTier {
    Authorized,
    Gold,
    Platinum,
}

impl fmt::Display for PartnerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PartnerTier::Authorized => "authorized",
            PartnerTier::Gold => "gold",
            PartnerTier::Platinum => "platinum",
        };
        f.write_str(s)
    }
}

/// Commission rate per partner tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub authorized: Rate,
    pub gold: Rate,
    pub platinum: Rate,
}

impl CommissionRates {
    /// Builds rates from basis points.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when any rate exceeds 100%.
    pub fn from_basis_points(
        authorized: u32,
        gold: u32,
        platinum: u32,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            authorized: Rate::from_basis_points(authorized)?,
            gold: Rate::from_basis_points(gold)?,
            platinum: Rate::from_basis_points(platinum)?,
        })
    }

    pub fn rate_for(&self, tier: PartnerTier) -> Rate {
        match tier {
            PartnerTier::Authorized => self.authorized,
            PartnerTier::Gold => self.gold,
            PartnerTier::Platinum => self.platinum,
        }
    }
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            authorized: Rate::new(2_500),
            gold: Rate::new(3_000),
            platinum: Rate::new(3_500),
        }
    }
}

/// Stateless `deal_value * rate[tier]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionCalculator {
    rates: CommissionRates,
}

impl CommissionCalculator {
    pub fn new(rates: CommissionRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &CommissionRates {
        &self.rates
    }

    /// Commission owed on `deal_value`, rounded to the nearest cent.
    pub fn compute(&self, tier: PartnerTier, deal_value: Money) -> Money {
        deal_value.apply_rate(self.rates.rate_for(tier))
    }
}
