//! Scoring policy: factor weights, category thresholds and signal tables.
//!
//! Everything the engine multiplies by lives here so it can be tuned from
//! configuration without touching the scoring code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Percentage, ValidationError};
use crate::domain::profile::{CompanyTier, ContactSeniority, EngagementStage, SourceChannel};

use super::RiskCategory;

/// One of the four weighted scoring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    CompanyTier,
    ContactSeniority,
    EngagementStage,
    AcquisitionChannel,
}

impl RiskFactor {
    /// All factors in evaluation order.
    pub const ALL: [RiskFactor; 4] = [
        RiskFactor::CompanyTier,
        RiskFactor::ContactSeniority,
        RiskFactor::EngagementStage,
        RiskFactor::AcquisitionChannel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::CompanyTier => "company_tier",
            RiskFactor::ContactSeniority => "contact_seniority",
            RiskFactor::EngagementStage => "engagement_stage",
            RiskFactor::AcquisitionChannel => "acquisition_channel",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum share of the score each factor may contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorWeights {
    company_tier: Percentage,
    contact_seniority: Percentage,
    engagement_stage: Percentage,
    acquisition_channel: Percentage,
}

impl FactorWeights {
    /// Creates a weight set.
    ///
    /// # Errors
    ///
    /// `OutOfRange` on `weights` when the four weights do not sum to 100.
    pub fn new(
        company_tier: Percentage,
        contact_seniority: Percentage,
        engagement_stage: Percentage,
        acquisition_channel: Percentage,
    ) -> Result<Self, ValidationError> {
        let weights = Self {
            company_tier,
            contact_seniority,
            engagement_stage,
            acquisition_channel,
        };
        let total = weights.total();
        if total != 100 {
            return Err(ValidationError::out_of_range("weights", 100, 100, total as i32));
        }
        Ok(weights)
    }

    pub fn weight(&self, factor: RiskFactor) -> Percentage {
        match factor {
            RiskFactor::CompanyTier => self.company_tier,
            RiskFactor::ContactSeniority => self.contact_seniority,
            RiskFactor::EngagementStage => self.engagement_stage,
            RiskFactor::AcquisitionChannel => self.acquisition_channel,
        }
    }

    fn total(&self) -> u32 {
        RiskFactor::ALL
            .iter()
            .map(|f| u32::from(self.weight(*f).value()))
            .sum()
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            company_tier: Percentage::new(40),
            contact_seniority: Percentage::new(25),
            engagement_stage: Percentage::new(20),
            acquisition_channel: Percentage::new(15),
        }
    }
}

/// Lower bounds of the Medium, High and Critical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    medium: Percentage,
    high: Percentage,
    critical: Percentage,
}

impl CategoryThresholds {
    /// # Errors
    ///
    /// `InvalidFormat` unless `0 < medium < high < critical`.
    pub fn new(
        medium: Percentage,
        high: Percentage,
        critical: Percentage,
    ) -> Result<Self, ValidationError> {
        if medium == Percentage::ZERO || medium >= high || high >= critical {
            return Err(ValidationError::invalid_format(
                "thresholds",
                format!(
                    "must be strictly ascending, got {}/{}/{}",
                    medium.value(),
                    high.value(),
                    critical.value()
                ),
            ));
        }
        Ok(Self {
            medium,
            high,
            critical,
        })
    }

    /// Maps a score to its category. Bounds are inclusive from below.
    pub fn categorize(&self, score: f64) -> RiskCategory {
        if score >= f64::from(self.critical.value()) {
            RiskCategory::Critical
        } else if score >= f64::from(self.high.value()) {
            RiskCategory::High
        } else if score >= f64::from(self.medium.value()) {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            medium: Percentage::new(40),
            high: Percentage::new(65),
            critical: Percentage::new(85),
        }
    }
}

/// Strength of each company-tier level, as a share of the factor's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyTierSignals {
    pub fortune_100: Percentage,
    pub fortune_500: Percentage,
    pub large_enterprise: Percentage,
    pub mid_market: Percentage,
    pub small_business: Percentage,
}

impl Default for CompanyTierSignals {
    fn default() -> Self {
        Self {
            fortune_100: Percentage::new(100),
            fortune_500: Percentage::new(80),
            large_enterprise: Percentage::new(60),
            mid_market: Percentage::new(40),
            small_business: Percentage::new(20),
        }
    }
}

impl CompanyTierSignals {
    pub fn strength(&self, tier: CompanyTier) -> Percentage {
        match tier {
            CompanyTier::Fortune100 => self.fortune_100,
            CompanyTier::Fortune500 => self.fortune_500,
            CompanyTier::LargeEnterprise => self.large_enterprise,
            CompanyTier::MidMarket => self.mid_market,
            CompanyTier::SmallBusiness => self.small_business,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenioritySignals {
    pub ciso: Percentage,
    pub c_suite: Percentage,
    pub vice_president: Percentage,
    pub director: Percentage,
    pub manager: Percentage,
    pub individual_contributor: Percentage,
}

impl Default for SenioritySignals {
    fn default() -> Self {
        Self {
            ciso: Percentage::new(100),
            c_suite: Percentage::new(90),
            vice_president: Percentage::new(75),
            director: Percentage::new(60),
            manager: Percentage::new(40),
            individual_contributor: Percentage::new(20),
        }
    }
}

impl SenioritySignals {
    pub fn strength(&self, seniority: ContactSeniority) -> Percentage {
        match seniority {
            ContactSeniority::Ciso => self.ciso,
            ContactSeniority::CSuite => self.c_suite,
            ContactSeniority::VicePresident => self.vice_president,
            ContactSeniority::Director => self.director,
            ContactSeniority::Manager => self.manager,
            ContactSeniority::IndividualContributor => self.individual_contributor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementSignals {
    pub demo_requested: Percentage,
    pub trial_requested: Percentage,
    pub evaluating: Percentage,
    pub inbound_inquiry: Percentage,
    pub cold: Percentage,
}

impl Default for EngagementSignals {
    fn default() -> Self {
        Self {
            demo_requested: Percentage::new(100),
            trial_requested: Percentage::new(85),
            evaluating: Percentage::new(60),
            inbound_inquiry: Percentage::new(40),
            cold: Percentage::new(10),
        }
    }
}

impl EngagementSignals {
    pub fn strength(&self, stage: EngagementStage) -> Percentage {
        match stage {
            EngagementStage::DemoRequested => self.demo_requested,
            EngagementStage::TrialRequested => self.trial_requested,
            EngagementStage::Evaluating => self.evaluating,
            EngagementStage::InboundInquiry => self.inbound_inquiry,
            EngagementStage::Cold => self.cold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSignals {
    pub referral: Percentage,
    pub partner: Percentage,
    pub direct: Percentage,
}

impl Default for ChannelSignals {
    fn default() -> Self {
        Self {
            referral: Percentage::new(100),
            partner: Percentage::new(90),
            direct: Percentage::new(30),
        }
    }
}

impl ChannelSignals {
    pub fn strength(&self, channel: SourceChannel) -> Percentage {
        match channel {
            SourceChannel::Referral => self.referral,
            SourceChannel::Partner => self.partner,
            SourceChannel::Direct => self.direct,
        }
    }
}

/// Per-level signal strengths for all four factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalTable {
    pub company_tier: CompanyTierSignals,
    pub seniority: SenioritySignals,
    pub engagement: EngagementSignals,
    pub channel: ChannelSignals,
}

/// Complete, validated scoring configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringPolicy {
    weights: FactorWeights,
    thresholds: CategoryThresholds,
    signals: SignalTable,
    recognized_enterprises: Vec<String>,
}

impl ScoringPolicy {
    /// Builds a policy. Weights and thresholds are validated by their own
    /// constructors; blank recognized names are rejected here.
    ///
    /// # Errors
    ///
    /// `EmptyField` on `recognized_enterprises` when an entry is blank.
    pub fn new(
        weights: FactorWeights,
        thresholds: CategoryThresholds,
        signals: SignalTable,
        recognized_enterprises: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let mut normalized = Vec::with_capacity(recognized_enterprises.len());
        for name in recognized_enterprises {
            let key = normalize_name(&name);
            if key.is_empty() {
                return Err(ValidationError::empty_field("recognized_enterprises"));
            }
            if !normalized.contains(&key) {
                normalized.push(key);
            }
        }
        Ok(Self {
            weights,
            thresholds,
            signals,
            recognized_enterprises: normalized,
        })
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &CategoryThresholds {
        &self.thresholds
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// True when the company name matches a configured recognized enterprise.
    /// Comparison ignores case and surrounding whitespace.
    pub fn is_recognized(&self, company_name: &str) -> bool {
        let key = normalize_name(company_name);
        self.recognized_enterprises.iter().any(|n| *n == key)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
