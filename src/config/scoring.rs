//! Risk scoring configuration
//!
//! Weights, thresholds and signal strengths are configuration so the
//! scoring can be tuned without a code change.

use serde::Deserialize;

use crate::domain::foundation::Percentage;
use crate::domain::risk::{CategoryThresholds, FactorWeights, ScoringPolicy, SignalTable};

use super::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: WeightsConfig,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Strength of each level within a factor, 0-100
    #[serde(default)]
    pub signals: SignalTable,

    /// Company names scored as Fortune-100 when no tier is stated.
    /// From the environment as a comma-separated list.
    #[serde(default)]
    pub recognized_enterprises: Vec<String>,
}

/// Factor weights in percent; must sum to 100.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_company_tier")]
    pub company_tier: u8,
    #[serde(default = "default_contact_seniority")]
    pub contact_seniority: u8,
    #[serde(default = "default_engagement_stage")]
    pub engagement_stage: u8,
    #[serde(default = "default_acquisition_channel")]
    pub acquisition_channel: u8,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            company_tier: default_company_tier(),
            contact_seniority: default_contact_seniority(),
            engagement_stage: default_engagement_stage(),
            acquisition_channel: default_acquisition_channel(),
        }
    }
}

/// Lower bounds of the Medium, High and Critical categories.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_medium")]
    pub medium: u8,
    #[serde(default = "default_high")]
    pub high: u8,
    #[serde(default = "default_critical")]
    pub critical: u8,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
            critical: default_critical(),
        }
    }
}

impl ScoringConfig {
    pub fn policy(&self) -> Result<ScoringPolicy, ValidationError> {
        let invalid = ValidationError::section;
        let pct = |v: u8| Percentage::try_new(v);

        let weights = FactorWeights::new(
            pct(self.weights.company_tier).map_err(invalid("scoring"))?,
            pct(self.weights.contact_seniority).map_err(invalid("scoring"))?,
            pct(self.weights.engagement_stage).map_err(invalid("scoring"))?,
            pct(self.weights.acquisition_channel).map_err(invalid("scoring"))?,
        )
        .map_err(invalid("scoring"))?;

        let thresholds = CategoryThresholds::new(
            pct(self.thresholds.medium).map_err(invalid("scoring"))?,
            pct(self.thresholds.high).map_err(invalid("scoring"))?,
            pct(self.thresholds.critical).map_err(invalid("scoring"))?,
        )
        .map_err(invalid("scoring"))?;

        ScoringPolicy::new(
            weights,
            thresholds,
            self.signals,
            self.recognized_enterprises.clone(),
        )
        .map_err(invalid("scoring"))
    }
}

fn default_company_tier() -> u8 {
    40
}

fn default_contact_seniority() -> u8 {
    25
}

fn default_engagement_stage() -> u8 {
    20
}

fn default_acquisition_channel() -> u8 {
    15
}

fn default_medium() -> u8 {
    40
}

fn default_high() -> u8 {
    65
}

fn default_critical() -> u8 {
    85
}
