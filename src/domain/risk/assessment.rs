//! RiskAssessment value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::RiskFactor;

/// Risk-to-value category derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
            RiskCategory::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// How much one known factor added to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: RiskFactor,
    /// Level observed on the profile, e.g. `"ciso"`.
    pub signal: String,
    /// Effective weight after redistribution, in score points.
    pub weight: f64,
    /// Points contributed; always within `[0, weight]`.
    pub contribution: f64,
}

/// Result of scoring one profile at one instant.
///
/// Never mutated. Reassessment produces a new value and the newest one on
/// the account is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub category: RiskCategory,
    /// Known factors, largest contribution first.
    pub factors: Vec<FactorContribution>,
    /// Factors whose weight was redistributed.
    pub unknown_factors: Vec<RiskFactor>,
    pub assessed_at: Timestamp,
}

impl RiskAssessment {
    /// Sum of effective weights of the known factors. 100 up to float error.
    pub fn effective_weight_total(&self) -> f64 {
        self.factors.iter().map(|f| f.weight).sum()
    }

    pub fn contribution_of(&self, factor: RiskFactor) -> Option<&FactorContribution> {
        self.factors.iter().find(|c| c.factor == factor)
    }
}
