//! Property-based tests for the scoring invariants.

use proptest::prelude::*;

use chrono::{TimeZone, Utc};

use crate::domain::foundation::Timestamp;
use crate::domain::profile::{
    CompanyProfile, CompanyTier, ContactSeniority, EmployeeCountBucket, EngagementStage, Industry,
    SourceChannel,
};

use super::{RiskAssessmentEngine, RiskFactor, SignalTable};

fn tier() -> impl Strategy<Value = CompanyTier> {
    prop_oneof![
        Just(CompanyTier::Fortune100),
        Just(CompanyTier::Fortune500),
        Just(CompanyTier::LargeEnterprise),
        Just(CompanyTier::MidMarket),
        Just(CompanyTier::SmallBusiness),
    ]
}

fn seniority() -> impl Strategy<Value = ContactSeniority> {
    prop_oneof![
        Just(ContactSeniority::Ciso),
        Just(ContactSeniority::CSuite),
        Just(ContactSeniority::VicePresident),
        Just(ContactSeniority::Director),
        Just(ContactSeniority::Manager),
        Just(ContactSeniority::IndividualContributor),
    ]
}

fn stage() -> impl Strategy<Value = EngagementStage> {
    prop_oneof![
        Just(EngagementStage::DemoRequested),
        Just(EngagementStage::TrialRequested),
        Just(EngagementStage::Evaluating),
        Just(EngagementStage::InboundInquiry),
        Just(EngagementStage::Cold),
    ]
}

fn channel() -> impl Strategy<Value = SourceChannel> {
    prop_oneof![
        Just(SourceChannel::Direct),
        Just(SourceChannel::Partner),
        Just(SourceChannel::Referral),
    ]
}

fn profile(
    tier: Option<CompanyTier>,
    seniority: Option<ContactSeniority>,
    stage: Option<EngagementStage>,
    channel: Option<SourceChannel>,
) -> CompanyProfile {
    CompanyProfile {
        name: "Vandelay Industries".to_string(),
        industry: Industry::Manufacturing,
        employee_count: EmployeeCountBucket::MidMarket,
        security_budget: None,
        compliance_frameworks: Default::default(),
        source_channel: channel,
        company_tier: tier,
        contact_seniority: seniority,
        engagement_stage: stage,
    }
}

fn at() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

proptest! {
    /// Property: with every factor known the score is the plain weighted sum.
    #[test]
    fn prop_all_known_score_is_weighted_sum(
        t in tier(),
        s in seniority(),
        e in stage(),
        c in channel(),
    ) {
        let engine = RiskAssessmentEngine::default();
        let signals = SignalTable::default();
        let assessment = engine.assess(&profile(Some(t), Some(s), Some(e), Some(c)), at()).unwrap();

        let expected = 40.0 * signals.company_tier.strength(t).as_fraction()
            + 25.0 * signals.seniority.strength(s).as_fraction()
            + 20.0 * signals.engagement.strength(e).as_fraction()
            + 15.0 * signals.channel.strength(c).as_fraction();

        prop_assert!((assessment.score - expected.clamp(0.0, 100.0)).abs() < 1e-9);
        prop_assert!(assessment.unknown_factors.is_empty());
    }

    /// Property: with exactly one factor unknown the remaining effective
    /// weights sum to 100.
    #[test]
    fn prop_single_unknown_weights_sum_to_hundred(
        t in tier(),
        s in seniority(),
        e in stage(),
        c in channel(),
        missing in 0usize..4,
    ) {
        let p = profile(
            (missing != 0).then_some(t),
            (missing != 1).then_some(s),
            (missing != 2).then_some(e),
            (missing != 3).then_some(c),
        );
        let assessment = RiskAssessmentEngine::default().assess(&p, at()).unwrap();

        prop_assert_eq!(assessment.unknown_factors.clone(), vec![RiskFactor::ALL[missing]]);
        prop_assert_eq!(assessment.factors.len(), 3);
        prop_assert!((assessment.effective_weight_total() - 100.0).abs() < 1e-9);
    }

    /// Property: score and every contribution stay inside their bands.
    #[test]
    fn prop_contributions_stay_in_band(
        t in proptest::option::of(tier()),
        s in proptest::option::of(seniority()),
        e in proptest::option::of(stage()),
        c in proptest::option::of(channel()),
    ) {
        let p = profile(t, s, e, c);
        let result = RiskAssessmentEngine::default().assess(&p, at());

        if t.is_none() && s.is_none() && e.is_none() && c.is_none() {
            prop_assert!(result.is_err());
        } else {
            let assessment = result.unwrap();
            prop_assert!((0.0..=100.0).contains(&assessment.score));
            for f in &assessment.factors {
                prop_assert!(f.contribution >= 0.0 && f.contribution <= f.weight + 1e-9);
            }
            prop_assert_eq!(assessment.factors.len() + assessment.unknown_factors.len(), 4);
        }
    }
}
