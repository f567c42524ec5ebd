//! Partner commission configuration

use serde::Deserialize;

use crate::domain::commission::CommissionRates;

use super::ValidationError;

/// Commission rates in basis points (2500 = 25%).
#[derive(Debug, Clone, Deserialize)]
pub struct CommissionConfig {
    #[serde(default = "default_authorized_bps")]
    pub authorized_bps: u32,

    #[serde(default = "default_gold_bps")]
    pub gold_bps: u32,

    #[serde(default = "default_platinum_bps")]
    pub platinum_bps: u32,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            authorized_bps: default_authorized_bps(),
            gold_bps: default_gold_bps(),
            platinum_bps: default_platinum_bps(),
        }
    }
}

impl CommissionConfig {
    pub fn rates(&self) -> Result<CommissionRates, ValidationError> {
        CommissionRates::from_basis_points(self.authorized_bps, self.gold_bps, self.platinum_bps)
            .map_err(ValidationError::section("commission"))
    }
}

fn default_authorized_bps() -> u32 {
    2_500
}

fn default_gold_bps() -> u32 {
    3_000
}

fn default_platinum_bps() -> u32 {
    3_500
}
