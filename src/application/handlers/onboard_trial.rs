//! OnboardTrialHandler - scores a profile, assigns a package and starts
//! the trial.

use std::sync::Arc;

use crate::application::publishing::EventSink;
use crate::domain::package::{PackageAssignment, PackageRecommender};
use crate::domain::profile::CompanyProfile;
use crate::domain::risk::RiskAssessmentEngine;
use crate::domain::trial::{LifecycleEvent, TrialAccount, TrialError, TrialLifecycleManager};
use crate::ports::{Clock, TrialRepository};

#[derive(Debug, Clone)]
pub struct OnboardTrialCommand {
    pub profile: CompanyProfile,
}

#[derive(Debug, Clone)]
pub struct OnboardTrialResult {
    pub account: TrialAccount,
    pub events: Vec<LifecycleEvent>,
}

pub struct OnboardTrialHandler {
    repository: Arc<dyn TrialRepository>,
    engine: Arc<RiskAssessmentEngine>,
    recommender: PackageRecommender,
    lifecycle: Arc<TrialLifecycleManager>,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl OnboardTrialHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        engine: Arc<RiskAssessmentEngine>,
        lifecycle: Arc<TrialLifecycleManager>,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        Self {
            repository,
            engine,
            recommender: PackageRecommender::new(),
            lifecycle,
            clock,
            events,
        }
    }

    /// # Errors
    ///
    /// - `Validation` for a malformed profile or one with no known signal
    /// - `Storage` when the account cannot be persisted
    pub async fn handle(&self, cmd: OnboardTrialCommand) -> Result<OnboardTrialResult, TrialError> {
        let now = self.clock.now();

        // 1. Score and recommend
        let risk = self.engine.assess(&cmd.profile, now)?;
        let tier = self.recommender.recommend(&risk, &cmd.profile);

        // 2. Create and start the trial
        let mut account = TrialAccount::new_pending(
            cmd.profile,
            risk,
            PackageAssignment::recommended(tier),
            self.lifecycle.settings().trial_length(),
            now,
        );
        let mut events = vec![LifecycleEvent::Onboarded {
            trial_id: account.id,
            company_name: account.profile.name.clone(),
            package_tier: tier,
            risk_score: account.risk.score,
            risk_category: account.risk.category,
            occurred_at: now,
        }];
        events.extend(self.lifecycle.activate(&mut account, now)?);

        // 3. Persist
        self.repository.insert(&account).await?;

        tracing::info!(
            trial_id = %account.id,
            company = %account.profile.name,
            score = account.risk.score,
            category = %account.risk.category,
            package = %tier,
            trial_end_at = %account.trial_end_at,
            "trial onboarded"
        );

        // 4. Publish
        self.events.publish(&events).await;

        Ok(OnboardTrialResult { account, events })
    }
}
