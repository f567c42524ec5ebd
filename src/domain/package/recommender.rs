//! PackageRecommender - decision table from risk category and company size.

use crate::domain::profile::{CompanyProfile, EmployeeCountBucket};
use crate::domain::risk::{RiskAssessment, RiskCategory};

use super::PackageTier;

use PackageTier::{Enterprise, Plus, Premium, Starter};

/// Recommends the most conservative fitting tier.
///
/// Cells listing two tiers are equally defensible; the lower one is always
/// chosen and upgrading is left to sales. The stated budget is not an input:
/// only the risk category and company size select the cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageRecommender;

impl PackageRecommender {
    pub fn new() -> Self {
        Self
    }

    /// Tiers the table considers for a cell, lowest first.
    pub fn candidates(
        &self,
        category: RiskCategory,
        bucket: EmployeeCountBucket,
    ) -> &'static [PackageTier] {
        use EmployeeCountBucket as E;
        use RiskCategory as C;

        match (category, bucket) {
            (C::Low, E::Micro | E::Small) => &[Starter],
            (C::Low, E::MidMarket) => &[Starter, Plus],
            (C::Low, E::Large | E::Enterprise) => &[Plus],

            (C::Medium, E::Micro) => &[Starter],
            (C::Medium, E::Small) => &[Starter, Plus],
            (C::Medium, E::MidMarket) => &[Plus],
            (C::Medium, E::Large) => &[Plus, Enterprise],
            (C::Medium, E::Enterprise) => &[Enterprise],

            (C::High, E::Micro | E::Small) => &[Plus],
            (C::High, E::MidMarket) => &[Plus, Enterprise],
            (C::High, E::Large) => &[Enterprise],
            (C::High, E::Enterprise) => &[Enterprise, Premium],

            (C::Critical, E::Micro | E::Small) => &[Enterprise],
            (C::Critical, E::MidMarket) => &[Enterprise, Premium],
            (C::Critical, E::Large | E::Enterprise) => &[Premium],
        }
    }

    pub fn recommend(&self, assessment: &RiskAssessment, profile: &CompanyProfile) -> PackageTier {
        self.candidates(assessment.category, profile.employee_count)
            .first()
            .copied()
            .unwrap_or(Starter)
    }
}
