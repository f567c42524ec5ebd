//! ReassessRiskHandler - rescores a trial with the current policy.
//!
//! The new assessment replaces the stored one and refreshes the
//! recommended tier. An override, if any, stays effective.

use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::domain::foundation::TrialId;
use crate::domain::package::{PackageRecommender, PackageTier};
use crate::domain::risk::{RiskAssessment, RiskAssessmentEngine};
use crate::domain::trial::TrialError;
use crate::ports::{Clock, TrialRepository};

use super::load_account;

#[derive(Debug, Clone, Copy)]
pub struct ReassessRiskCommand {
    pub trial_id: TrialId,
}

#[derive(Debug, Clone)]
pub struct ReassessRiskResult {
    pub assessment: RiskAssessment,
    pub recommended: PackageTier,
    pub effective: PackageTier,
}

pub struct ReassessRiskHandler {
    repository: Arc<dyn TrialRepository>,
    locks: Arc<AccountLocks>,
    engine: Arc<RiskAssessmentEngine>,
    recommender: PackageRecommender,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl ReassessRiskHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        locks: Arc<AccountLocks>,
        engine: Arc<RiskAssessmentEngine>,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        Self {
            repository,
            locks,
            engine,
            recommender: PackageRecommender::new(),
            clock,
            events,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` for an unknown trial
    /// - `StateConflict` for an archived trial
    /// - `Validation` when the current policy knows none of the profile's signals
    pub async fn handle(&self, cmd: ReassessRiskCommand) -> Result<ReassessRiskResult, TrialError> {
        let (result, event) = {
            let _guard = self.locks.acquire(cmd.trial_id).await;
            let now = self.clock.now();
            let mut account = load_account(self.repository.as_ref(), cmd.trial_id).await?;

            let assessment = self.engine.assess(&account.profile, now)?;
            let recommended = self.recommender.recommend(&assessment, &account.profile);
            let event = account.record_reassessment(assessment.clone(), recommended)?;
            self.repository.update(&account).await?;

            let result = ReassessRiskResult {
                assessment,
                recommended,
                effective: account.package.effective(),
            };
            (result, event)
        };

        tracing::info!(
            trial_id = %cmd.trial_id,
            score = result.assessment.score,
            category = %result.assessment.category,
            recommended = %result.recommended,
            effective = %result.effective,
            "risk reassessed"
        );
        self.events.publish(&[event]).await;
        Ok(result)
    }
}
