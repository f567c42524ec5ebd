//! Orchestrator - the public facade over the trial handlers.
//!
//! Wires one instance of every handler to a shared set of ports, a shared
//! lock table and a shared event sink. Callers hold an `Orchestrator` (usually
//! behind an `Arc`) and never touch the handlers directly.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ValidationError};
use crate::domain::commission::{
    CommissionCalculator, CommissionRates, CommissionRecord, PartnerAttribution,
};
use crate::domain::foundation::{PartnerId, Timestamp, TrialId};
use crate::domain::notification::RetryPolicy;
use crate::domain::package::PackageTier;
use crate::domain::profile::CompanyProfile;
use crate::domain::risk::{RiskAssessmentEngine, ScoringPolicy};
use crate::domain::trial::{
    ActivityRecord, LifecycleEvent, LifecycleSettings, TrialAccount, TrialError, TrialStatus,
    TrialLifecycleManager,
};
use crate::ports::{Clock, CommissionRepository, EventPublisher, Notifier, TrialRepository};

use super::handlers::{
    ExtendTrialCommand, ExtendTrialHandler, FollowUpItem, GetTrialHandler, GetTrialQuery,
    ListFollowUpsHandler, ListFollowUpsQuery, OnboardTrialCommand, OnboardTrialHandler,
    OverridePackageCommand, OverridePackageHandler, ReassessRiskCommand, ReassessRiskHandler,
    ReassessRiskResult, RecordActivityCommand, RecordActivityHandler, RecordConversionCommand,
    RecordConversionHandler, RunTickCommand, RunTickHandler, TickResult,
};
use super::locks::AccountLocks;
use super::publishing::EventSink;
use super::scheduler::NotificationScheduler;

/// External collaborators of the engine.
#[derive(Clone)]
pub struct OrchestratorPorts {
    pub trials: Arc<dyn TrialRepository>,
    pub commissions: Arc<dyn CommissionRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    /// Optional; without one, lifecycle events are only returned to callers.
    pub events: Option<Arc<dyn EventPublisher>>,
}

/// Validated policies the engine runs with.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scoring: ScoringPolicy,
    pub lifecycle: LifecycleSettings,
    pub commission_rates: CommissionRates,
    pub retry: RetryPolicy,
    pub send_timeout: Duration,
    pub worker_pool_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            lifecycle: LifecycleSettings::default(),
            commission_rates: CommissionRates::default(),
            retry: RetryPolicy::default(),
            send_timeout: Duration::from_secs(10),
            worker_pool_size: 8,
        }
    }
}

impl EngineSettings {
    /// Builds every domain policy from configuration.
    ///
    /// # Errors
    ///
    /// The first section that does not validate.
    pub fn from_config(config: &AppConfig) -> Result<Self, ValidationError> {
        config.engine.validate()?;
        config.delivery.validate()?;
        Ok(Self {
            scoring: config.scoring.policy()?,
            lifecycle: config.lifecycle.settings()?,
            commission_rates: config.commission.rates()?,
            retry: config.delivery.retry_policy()?,
            send_timeout: config.delivery.send_timeout(),
            worker_pool_size: config.engine.worker_pool_size,
        })
    }
}

pub struct Orchestrator {
    trials: Arc<dyn TrialRepository>,
    commissions: Arc<dyn CommissionRepository>,
    clock: Arc<dyn Clock>,
    onboard: OnboardTrialHandler,
    run_tick: RunTickHandler,
    record_activity: RecordActivityHandler,
    record_conversion: RecordConversionHandler,
    override_package: OverridePackageHandler,
    extend_trial: ExtendTrialHandler,
    reassess_risk: ReassessRiskHandler,
    list_follow_ups: ListFollowUpsHandler,
    get_trial: GetTrialHandler,
}

impl Orchestrator {
    pub fn new(ports: OrchestratorPorts, settings: EngineSettings) -> Self {
        let OrchestratorPorts {
            trials,
            commissions,
            notifier,
            clock,
            events,
        } = ports;

        let sink = events.map(EventSink::new).unwrap_or_default();
        let locks = Arc::new(AccountLocks::new());
        let engine = Arc::new(RiskAssessmentEngine::new(settings.scoring));
        let lifecycle = Arc::new(TrialLifecycleManager::new(
            settings.lifecycle,
            CommissionCalculator::new(settings.commission_rates),
        ));
        let scheduler = Arc::new(NotificationScheduler::new(
            notifier,
            settings.retry,
            settings.send_timeout,
            settings.lifecycle.expiring_window(),
        ));

        Self {
            onboard: OnboardTrialHandler::new(
                trials.clone(),
                engine.clone(),
                lifecycle.clone(),
                clock.clone(),
                sink.clone(),
            ),
            run_tick: RunTickHandler::new(
                trials.clone(),
                locks.clone(),
                lifecycle.clone(),
                scheduler,
                sink.clone(),
                settings.worker_pool_size,
            ),
            record_activity: RecordActivityHandler::new(
                trials.clone(),
                locks.clone(),
                lifecycle.clone(),
                clock.clone(),
                sink.clone(),
            ),
            record_conversion: RecordConversionHandler::new(
                trials.clone(),
                commissions.clone(),
                locks.clone(),
                lifecycle.clone(),
                clock.clone(),
                sink.clone(),
            ),
            override_package: OverridePackageHandler::new(
                trials.clone(),
                locks.clone(),
                clock.clone(),
                sink.clone(),
            ),
            extend_trial: ExtendTrialHandler::new(
                trials.clone(),
                locks.clone(),
                lifecycle,
                clock.clone(),
                sink.clone(),
            ),
            reassess_risk: ReassessRiskHandler::new(
                trials.clone(),
                locks,
                engine,
                clock.clone(),
                sink,
            ),
            list_follow_ups: ListFollowUpsHandler::new(trials.clone()),
            get_trial: GetTrialHandler::new(trials.clone()),
            trials,
            commissions,
            clock,
        }
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Scores the profile, assigns a package and starts a trial.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed profile or one with no known signal
    /// - `Storage` when the account cannot be persisted
    pub async fn onboard(&self, profile: CompanyProfile) -> Result<TrialAccount, TrialError> {
        let result = self.onboard.handle(OnboardTrialCommand { profile }).await?;
        Ok(result.account)
    }

    /// Evaluates every account at `now`. Idempotent; any cadence.
    ///
    /// # Errors
    ///
    /// `Storage` when the account list cannot be read. Failures confined to
    /// a single account are logged and skipped.
    pub async fn tick(&self, now: Timestamp) -> Result<Vec<LifecycleEvent>, TrialError> {
        Ok(self.run_tick(now).await?.events)
    }

    /// Like [`Orchestrator::tick`], with per-account counts.
    pub async fn run_tick(&self, now: Timestamp) -> Result<TickResult, TrialError> {
        self.run_tick.handle(RunTickCommand { now }).await
    }

    /// # Errors
    ///
    /// `NotFound`, `StateConflict` for an archived account, `Storage`.
    pub async fn record_activity(
        &self,
        trial_id: TrialId,
        activity: ActivityRecord,
    ) -> Result<(), TrialError> {
        self.record_activity
            .handle(RecordActivityCommand { trial_id, activity })
            .await
    }

    /// Marks the trial converted. Returns the commission when an attribution
    /// is supplied.
    ///
    /// # Errors
    ///
    /// - `NotFound`
    /// - `StateConflict` unless the account is active
    /// - `Validation` for a malformed attribution
    /// - `Storage`
    pub async fn record_conversion(
        &self,
        trial_id: TrialId,
        attribution: Option<PartnerAttribution>,
    ) -> Result<Option<CommissionRecord>, TrialError> {
        let result = self
            .record_conversion
            .handle(RecordConversionCommand {
                trial_id,
                attribution,
            })
            .await?;
        Ok(result.commission)
    }

    /// Pins the effective package. The override survives reassessment.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation` for a blank reason, `Storage`.
    pub async fn override_package(
        &self,
        trial_id: TrialId,
        tier: PackageTier,
        reason: impl Into<String>,
    ) -> Result<(), TrialError> {
        self.override_package
            .handle(OverridePackageCommand {
                trial_id,
                tier,
                reason: reason.into(),
            })
            .await
            .map(|_| ())
    }

    /// Moves the trial end and reschedules end-anchored milestones.
    ///
    /// # Errors
    ///
    /// - `NotFound`
    /// - `StateConflict` unless the account is active
    /// - `Validation` when `new_end` is not later than the current end and now
    /// - `Storage`
    pub async fn extend_trial(
        &self,
        trial_id: TrialId,
        new_end: Timestamp,
    ) -> Result<TrialAccount, TrialError> {
        self.extend_trial
            .handle(ExtendTrialCommand { trial_id, new_end })
            .await
    }

    /// Re-scores the stored profile with the current policy.
    pub async fn reassess_risk(&self, trial_id: TrialId) -> Result<ReassessRiskResult, TrialError> {
        self.reassess_risk
            .handle(ReassessRiskCommand { trial_id })
            .await
    }

    /// Milestones whose deliveries were exhausted, across all accounts.
    pub async fn list_follow_ups(&self) -> Result<Vec<FollowUpItem>, TrialError> {
        self.list_follow_ups.handle(ListFollowUpsQuery).await
    }

    pub async fn trial(&self, trial_id: TrialId) -> Result<TrialAccount, TrialError> {
        self.get_trial.handle(GetTrialQuery { trial_id }).await
    }

    pub async fn trials_by_status(
        &self,
        status: TrialStatus,
    ) -> Result<Vec<TrialAccount>, TrialError> {
        Ok(self.trials.list_by_status(status).await?)
    }

    pub async fn commissions_for_partner(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<CommissionRecord>, TrialError> {
        Ok(self.commissions.list_by_partner(partner_id).await?)
    }
}
