//! RiskAssessmentEngine - scores a company profile against a policy.

use crate::domain::foundation::{Percentage, Timestamp, ValidationError};
use crate::domain::profile::{CompanyProfile, CompanyTier};

use super::{FactorContribution, RiskAssessment, RiskFactor, ScoringPolicy};

/// Observed level of a single factor.
struct Signal {
    label: String,
    strength: Percentage,
}

/// Pure, deterministic scorer.
///
/// Unknown factors do not count as zero: their weight is spread over the
/// known factors in proportion to the known weights, so the effective
/// weights of the known factors always sum to 100.
#[derive(Debug, Clone, Default)]
pub struct RiskAssessmentEngine {
    policy: ScoringPolicy,
}

impl RiskAssessmentEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Scores `profile` as of `at`.
    ///
    /// # Errors
    ///
    /// - the profile's own validation errors
    /// - `InvalidFormat` on `risk_signals` when no factor with a non-zero
    ///   weight is known, since no score can be derived
    pub fn assess(
        &self,
        profile: &CompanyProfile,
        at: Timestamp,
    ) -> Result<RiskAssessment, ValidationError> {
        profile.validate()?;

        let weights = self.policy.weights();
        let mut known: Vec<(RiskFactor, Signal)> = Vec::with_capacity(RiskFactor::ALL.len());
        let mut unknown_factors = Vec::new();

        for factor in RiskFactor::ALL {
            match self.signal_for(factor, profile) {
                Some(signal) => known.push((factor, signal)),
                None => unknown_factors.push(factor),
            }
        }

        let known_weight: u32 = known
            .iter()
            .map(|(factor, _)| u32::from(weights.weight(*factor).value()))
            .sum();
        if known_weight == 0 {
            return Err(ValidationError::invalid_format(
                "risk_signals",
                "no weighted risk factor is known for this profile",
            ));
        }

        let scale = 100.0 / f64::from(known_weight);
        let mut factors: Vec<FactorContribution> = known
            .into_iter()
            .map(|(factor, signal)| {
                let weight = f64::from(weights.weight(factor).value()) * scale;
                let contribution = (weight * signal.strength.as_fraction()).clamp(0.0, weight);
                FactorContribution {
                    factor,
                    signal: signal.label,
                    weight,
                    contribution,
                }
            })
            .collect();

        let score = factors
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(0.0, 100.0);

        // Stable sort keeps evaluation order among equal contributions.
        factors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

        Ok(RiskAssessment {
            score,
            category: self.policy.thresholds().categorize(score),
            factors,
            unknown_factors,
            assessed_at: at,
        })
    }

    fn signal_for(&self, factor: RiskFactor, profile: &CompanyProfile) -> Option<Signal> {
        let signals = self.policy.signals();
        match factor {
            RiskFactor::CompanyTier => {
                let (tier, label) = match profile.company_tier {
                    Some(tier) => (tier, tier.as_str().to_string()),
                    None if self.policy.is_recognized(&profile.name) => (
                        CompanyTier::Fortune100,
                        format!("{} (recognized)", CompanyTier::Fortune100.as_str()),
                    ),
                    None => return None,
                };
                Some(Signal {
                    label,
                    strength: signals.company_tier.strength(tier),
                })
            }
            RiskFactor::ContactSeniority => profile.contact_seniority.map(|s| Signal {
                label: s.as_str().to_string(),
                strength: signals.seniority.strength(s),
            }),
            RiskFactor::EngagementStage => profile.engagement_stage.map(|s| Signal {
                label: s.as_str().to_string(),
                strength: signals.engagement.strength(s),
            }),
            RiskFactor::AcquisitionChannel => profile.source_channel.map(|c| Signal {
                label: c.as_str().to_string(),
                strength: signals.channel.strength(c),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{
        ContactSeniority, EmployeeCountBucket, EngagementStage, Industry, SourceChannel,
    };
    use crate::domain::risk::{CategoryThresholds, FactorWeights, RiskCategory, SignalTable};
    use chrono::{TimeZone, Utc};

    fn at() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
    }

    fn builder() -> crate::domain::profile::CompanyProfileBuilder {
        CompanyProfile::builder()
            .name("Initech")
            .industry(Industry::Technology)
            .employee_count(EmployeeCountBucket::Large)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn strongest_profile_is_critical() {
        let profile = builder()
            .company_tier(CompanyTier::Fortune100)
            .contact_seniority(ContactSeniority::Ciso)
            .engagement_stage(EngagementStage::DemoRequested)
            .source_channel(SourceChannel::Referral)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::default().assess(&profile, at()).unwrap();

        assert!(approx(assessment.score, 100.0));
        assert_eq!(assessment.category, RiskCategory::Critical);
        assert!(assessment.unknown_factors.is_empty());
        assert_eq!(assessment.assessed_at, at());
    }

    #[test]
    fn all_known_score_is_weighted_sum() {
        // 40*0.6 + 25*0.4 + 20*0.6 + 15*0.3 = 24 + 10 + 12 + 4.5
        let profile = builder()
            .company_tier(CompanyTier::LargeEnterprise)
            .contact_seniority(ContactSeniority::Manager)
            .engagement_stage(EngagementStage::Evaluating)
            .source_channel(SourceChannel::Direct)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::default().assess(&profile, at()).unwrap();

        assert!(approx(assessment.score, 50.5));
        assert_eq!(assessment.category, RiskCategory::Medium);
    }

    #[test]
    fn factors_are_ordered_by_contribution() {
        let profile = builder()
            .company_tier(CompanyTier::SmallBusiness)
            .contact_seniority(ContactSeniority::Ciso)
            .engagement_stage(EngagementStage::Cold)
            .source_channel(SourceChannel::Referral)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::default().assess(&profile, at()).unwrap();
        let order: Vec<RiskFactor> = assessment.factors.iter().map(|f| f.factor).collect();

        // 25, 15, 8, 2
        assert_eq!(
            order,
            vec![
                RiskFactor::ContactSeniority,
                RiskFactor::AcquisitionChannel,
                RiskFactor::CompanyTier,
                RiskFactor::EngagementStage,
            ]
        );
        assert_eq!(assessment.factors[0].signal, "ciso");
    }

    #[test]
    fn one_unknown_factor_is_redistributed() {
        let profile = builder()
            .contact_seniority(ContactSeniority::Ciso)
            .engagement_stage(EngagementStage::DemoRequested)
            .source_channel(SourceChannel::Referral)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::default().assess(&profile, at()).unwrap();

        assert_eq!(assessment.unknown_factors, vec![RiskFactor::CompanyTier]);
        assert!(approx(assessment.effective_weight_total(), 100.0));
        // 25/60 of 100
        let seniority = assessment.contribution_of(RiskFactor::ContactSeniority).unwrap();
        assert!(approx(seniority.weight, 100.0 * 25.0 / 60.0));
        // Missing data does not drag a perfect profile down.
        assert!(approx(assessment.score, 100.0));
    }

    #[test]
    fn two_unknown_factors_are_redistributed() {
        let profile = builder()
            .company_tier(CompanyTier::Fortune500)
            .source_channel(SourceChannel::Partner)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::default().assess(&profile, at()).unwrap();

        assert_eq!(assessment.unknown_factors.len(), 2);
        assert!(approx(assessment.effective_weight_total(), 100.0));
        // (40*0.8 + 15*0.9) * 100/55
        assert!(approx(assessment.score, (32.0 + 13.5) * 100.0 / 55.0));
    }

    #[test]
    fn profile_without_any_signal_fails_fast() {
        let profile = builder().build().unwrap();
        let err = RiskAssessmentEngine::default()
            .assess(&profile, at())
            .unwrap_err();
        assert_eq!(err.field(), "risk_signals");
    }

    #[test]
    fn malformed_profile_fails_fast() {
        let mut profile = builder()
            .source_channel(SourceChannel::Direct)
            .build()
            .unwrap();
        profile.name = String::new();

        let err = RiskAssessmentEngine::default()
            .assess(&profile, at())
            .unwrap_err();
        assert_eq!(err, ValidationError::empty_field("name"));
    }

    #[test]
    fn recognized_name_stands_in_for_missing_tier() {
        let policy = ScoringPolicy::new(
            FactorWeights::default(),
            CategoryThresholds::default(),
            SignalTable::default(),
            vec!["Initech".to_string()],
        )
        .unwrap();
        let profile = builder()
            .source_channel(SourceChannel::Direct)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::new(policy).assess(&profile, at()).unwrap();

        let tier = assessment.contribution_of(RiskFactor::CompanyTier).unwrap();
        assert_eq!(tier.signal, "fortune_100 (recognized)");
        assert!(!assessment.unknown_factors.contains(&RiskFactor::CompanyTier));
    }

    #[test]
    fn stated_tier_beats_recognized_name() {
        let policy = ScoringPolicy::new(
            FactorWeights::default(),
            CategoryThresholds::default(),
            SignalTable::default(),
            vec!["Initech".to_string()],
        )
        .unwrap();
        let profile = builder()
            .company_tier(CompanyTier::MidMarket)
            .build()
            .unwrap();

        let assessment = RiskAssessmentEngine::new(policy).assess(&profile, at()).unwrap();
        assert_eq!(
            assessment.contribution_of(RiskFactor::CompanyTier).unwrap().signal,
            "mid_market"
        );
    }

    #[test]
    fn zero_weight_known_factor_alone_cannot_score() {
        let weights = FactorWeights::new(
            Percentage::new(50),
            Percentage::new(30),
            Percentage::new(20),
            Percentage::new(0),
        )
        .unwrap();
        let policy = ScoringPolicy::new(
            weights,
            CategoryThresholds::default(),
            SignalTable::default(),
            Vec::new(),
        )
        .unwrap();
        let profile = builder()
            .source_channel(SourceChannel::Referral)
            .build()
            .unwrap();

        assert!(RiskAssessmentEngine::new(policy).assess(&profile, at()).is_err());
    }
}
