//! Risk assessment domain module.
//!
//! Maps a [`CompanyProfile`](crate::domain::profile::CompanyProfile) to a
//! bounded risk-to-value score and category using a configurable weighted
//! factor table.

mod assessment;
mod engine;
mod policy;

#[cfg(test)]
mod proptest_scoring;

pub use assessment::{FactorContribution, RiskAssessment, RiskCategory};
pub use engine::RiskAssessmentEngine;
pub use policy::{
    CategoryThresholds, ChannelSignals, CompanyTierSignals, EngagementSignals, FactorWeights,
    RiskFactor, ScoringPolicy, SenioritySignals, SignalTable,
};
