//! PackageTier - the fixed commercial offering ladder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Money, ValidationError};

/// Commercial package, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Starter,
    Plus,
    Enterprise,
    Premium,
}

impl PackageTier {
    /// All tiers, smallest first.
    pub const ALL: [PackageTier; 4] = [
        PackageTier::Starter,
        PackageTier::Plus,
        PackageTier::Enterprise,
        PackageTier::Premium,
    ];

    /// Annual list price range as `(min, max)`.
    pub fn list_price(&self) -> (Money, Money) {
        match self {
            PackageTier::Starter => (Money::from_dollars(12_000), Money::from_dollars(48_000)),
            PackageTier::Plus => (Money::from_dollars(48_000), Money::from_dollars(150_000)),
            PackageTier::Enterprise => {
                (Money::from_dollars(150_000), Money::from_dollars(600_000))
            }
            PackageTier::Premium => (Money::from_dollars(600_000), Money::from_dollars(2_500_000)),
        }
    }

    /// Features every account on this tier is guaranteed.
    pub fn minimum_features(&self) -> &'static [&'static str] {
        match self {
            PackageTier::Starter => &["vulnerability_scanning", "email_support"],
            PackageTier::Plus => &[
                "vulnerability_scanning",
                "email_support",
                "compliance_reporting",
                "quarterly_review",
            ],
            PackageTier::Enterprise => &[
                "vulnerability_scanning",
                "compliance_reporting",
                "dedicated_consultant",
                "incident_response",
                "sso",
            ],
            PackageTier::Premium => &[
                "vulnerability_scanning",
                "compliance_reporting",
                "dedicated_consultant",
                "incident_response",
                "sso",
                "managed_detection",
                "executive_briefings",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageTier::Starter => "starter",
            PackageTier::Plus => "plus",
            PackageTier::Enterprise => "enterprise",
            PackageTier::Premium => "premium",
        }
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(PackageTier::Starter),
            "plus" => Ok(PackageTier::Plus),
            "enterprise" => Ok(PackageTier::Enterprise),
            "premium" => Ok(PackageTier::Premium),
            other => Err(ValidationError::invalid_format(
                "package_tier",
                format!("unknown tier '{}'", other),
            )),
        }
    }
}
