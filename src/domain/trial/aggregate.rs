//! TrialAccount aggregate.
//!
//! The central mutable entity. It exclusively owns its milestones and
//! activity records and is stored as one flat document.
//!
//! # Invariants
//!
//! - `trial_end_at == trial_start_at + trial_duration_secs`
//! - status transitions follow [`TrialStatus`]'s state machine; the only
//!   non-monotonic move is an extension (Active -> Active)
//! - milestones are cancelled, never removed
//! - activities are kept ordered by `occurred_at`

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::commission::PartnerTier;
use crate::domain::foundation::{
    CommissionId, MilestoneId, PartnerId, StateMachine, Timestamp, TrialId,
};
use crate::domain::package::{PackageAssignment, PackageTier};
use crate::domain::profile::CompanyProfile;
use crate::domain::risk::RiskAssessment;

use super::{
    ActivityRecord, LifecycleEvent, ScheduledMilestone, TrialError, TrialPhase, TrialStatus,
};

/// Conversion facts kept on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionInfo {
    pub converted_at: Timestamp,
    pub partner_id: Option<PartnerId>,
    pub partner_tier: Option<PartnerTier>,
    pub commission_id: Option<CommissionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialAccount {
    pub id: TrialId,
    pub profile: CompanyProfile,
    pub package: PackageAssignment,
    /// Latest assessment; authoritative.
    pub risk: RiskAssessment,
    pub status: TrialStatus,
    pub created_at: Timestamp,
    pub trial_start_at: Timestamp,
    pub trial_duration_secs: i64,
    pub trial_end_at: Timestamp,
    pub last_activity_at: Option<Timestamp>,
    #[serde(default)]
    pub milestones: Vec<ScheduledMilestone>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    /// Trial end for which the expiring-window event already fired.
    pub expiring_notified_for: Option<Timestamp>,
    /// When the account became Converted or Expired.
    pub closed_at: Option<Timestamp>,
    pub conversion: Option<ConversionInfo>,
    #[serde(default)]
    pub extension_count: u32,
    pub updated_at: Timestamp,
}

impl TrialAccount {
    /// Creates a Pending account whose window would start now.
    pub fn new_pending(
        profile: CompanyProfile,
        risk: RiskAssessment,
        package: PackageAssignment,
        trial_length: Duration,
        now: Timestamp,
    ) -> Self {
        Self {
            id: TrialId::new(),
            profile,
            package,
            risk,
            status: TrialStatus::Pending,
            created_at: now,
            trial_start_at: now,
            trial_duration_secs: trial_length.num_seconds(),
            trial_end_at: now.add_duration(trial_length),
            last_activity_at: None,
            milestones: Vec::new(),
            activities: Vec::new(),
            expiring_notified_for: None,
            closed_at: None,
            conversion: None,
            extension_count: 0,
            updated_at: now,
        }
    }

    pub fn trial_duration(&self) -> Duration {
        Duration::seconds(self.trial_duration_secs)
    }

    /// Status refined by `now`: an Active account inside the final `window`
    /// before its end is Expiring.
    pub fn phase(&self, now: Timestamp, window: Duration) -> TrialPhase {
        match self.status {
            TrialStatus::Pending => TrialPhase::Pending,
            TrialStatus::Active if now >= self.trial_end_at.minus_duration(window) => {
                TrialPhase::Expiring
            }
            TrialStatus::Active => TrialPhase::Active,
            TrialStatus::Converted => TrialPhase::Converted,
            TrialStatus::Expired => TrialPhase::Expired,
            TrialStatus::Archived => TrialPhase::Archived,
        }
    }

    pub fn milestone(&self, id: &MilestoneId) -> Option<&ScheduledMilestone> {
        self.milestones.iter().find(|m| m.id == *id)
    }

    pub fn milestone_mut(&mut self, id: &MilestoneId) -> Option<&mut ScheduledMilestone> {
        self.milestones.iter_mut().find(|m| m.id == *id)
    }

    pub fn pending_milestones(&self) -> impl Iterator<Item = &ScheduledMilestone> {
        self.milestones.iter().filter(|m| m.is_pending())
    }

    pub fn milestones_needing_follow_up(&self) -> impl Iterator<Item = &ScheduledMilestone> {
        self.milestones.iter().filter(|m| m.needs_follow_up)
    }

    /// Appends a milestone, keeping the list ordered by due time.
    pub fn schedule(&mut self, milestone: ScheduledMilestone) {
        let idx = self
            .milestones
            .partition_point(|m| m.due_at <= milestone.due_at);
        self.milestones.insert(idx, milestone);
    }

    /// Cancels every pending milestone matching `pred`; returns their ids.
    pub fn cancel_pending_where<F>(&mut self, at: Timestamp, mut pred: F) -> Vec<MilestoneId>
    where
        F: FnMut(&ScheduledMilestone) -> bool,
    {
        let mut cancelled = Vec::new();
        for m in self.milestones.iter_mut() {
            if m.is_pending() && pred(m) && m.cancel(at) {
                cancelled.push(m.id);
            }
        }
        cancelled
    }

    /// Instant the retention window counts from.
    pub fn retention_anchor(&self) -> Option<Timestamp> {
        let closed = self.closed_at?;
        Some(match self.last_activity_at {
            Some(activity) => closed.max(activity),
            None => closed,
        })
    }

    /// Moves to `target` through the state machine.
    ///
    /// # Errors
    ///
    /// `StateConflict` naming `attempted` when the transition is illegal.
    pub(crate) fn transition_to(
        &mut self,
        target: TrialStatus,
        attempted: &'static str,
    ) -> Result<(), TrialError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|rejected| TrialError::state_conflict(rejected.from, attempted))?;
        Ok(())
    }

    pub(crate) fn ensure_not_archived(&self, attempted: &'static str) -> Result<(), TrialError> {
        if self.status == TrialStatus::Archived {
            return Err(TrialError::state_conflict(self.status, attempted));
        }
        Ok(())
    }

    /// Records an administrative package override.
    ///
    /// # Errors
    ///
    /// - `StateConflict` on an archived account
    /// - `Validation` for a blank or overlong reason
    pub fn override_package(
        &mut self,
        tier: PackageTier,
        reason: &str,
        at: Timestamp,
    ) -> Result<LifecycleEvent, TrialError> {
        self.ensure_not_archived("override the package of")?;
        let previous_tier = self.package.effective();
        self.package.apply_override(tier, reason, at)?;
        self.updated_at = at;
        Ok(LifecycleEvent::PackageOverridden {
            trial_id: self.id,
            previous_tier,
            new_tier: tier,
            reason: reason.trim().to_string(),
            occurred_at: at,
        })
    }

    /// Stores a fresh assessment and recommendation. Overrides stay in force.
    ///
    /// # Errors
    ///
    /// `StateConflict` on an archived account.
    pub fn record_reassessment(
        &mut self,
        assessment: RiskAssessment,
        recommended: PackageTier,
    ) -> Result<LifecycleEvent, TrialError> {
        self.ensure_not_archived("reassess")?;
        let at = assessment.assessed_at;
        let event = LifecycleEvent::RiskReassessed {
            trial_id: self.id,
            score: assessment.score,
            category: assessment.category,
            recommended_tier: recommended,
            occurred_at: at,
        };
        self.risk = assessment;
        self.package.refresh_recommendation(recommended);
        self.updated_at = at;
        Ok(event)
    }

    /// Inserts an activity in chronological order and advances
    /// `last_activity_at`.
    pub(crate) fn push_activity(&mut self, record: ActivityRecord) {
        let at = record.occurred_at;
        let idx = self
            .activities
            .partition_point(|a| a.occurred_at <= record.occurred_at);
        self.activities.insert(idx, record);
        self.last_activity_at = Some(match self.last_activity_at {
            Some(prev) => prev.max(at),
            None => at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{EmployeeCountBucket, Industry, SourceChannel};
    use crate::domain::risk::RiskAssessmentEngine;
    use crate::domain::trial::{ActivityKind, MilestoneKind, MilestoneStatus};
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn account() -> TrialAccount {
        let profile = CompanyProfile::builder()
            .name("Massive Dynamic")
            .industry(Industry::Technology)
            .employee_count(EmployeeCountBucket::Enterprise)
            .source_channel(SourceChannel::Partner)
            .build()
            .unwrap();
        let risk = RiskAssessmentEngine::default().assess(&profile, t0()).unwrap();
        TrialAccount::new_pending(
            profile,
            risk,
            PackageAssignment::recommended(PackageTier::Plus),
            Duration::days(30),
            t0(),
        )
    }

    #[test]
    fn new_pending_satisfies_end_invariant() {
        let a = account();
        assert_eq!(a.status, TrialStatus::Pending);
        assert_eq!(a.trial_end_at, a.trial_start_at.add_duration(a.trial_duration()));
    }

    #[test]
    fn phase_is_expiring_inside_final_window() {
        let mut a = account();
        a.status = TrialStatus::Active;
        let window = Duration::days(7);
        assert_eq!(a.phase(t0().add_days(22), window), TrialPhase::Active);
        assert_eq!(a.phase(t0().add_days(23), window), TrialPhase::Expiring);
        assert_eq!(a.phase(t0().add_days(31), window), TrialPhase::Expiring);
    }

    #[test]
    fn schedule_keeps_due_order() {
        let mut a = account();
        a.schedule(ScheduledMilestone::new(MilestoneKind::ReminderD1, t0().add_days(29), None));
        a.schedule(ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None));
        a.schedule(ScheduledMilestone::new(MilestoneKind::ReminderD7, t0().add_days(23), None));
        let kinds: Vec<_> = a.milestones.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MilestoneKind::WelcomeSent, MilestoneKind::ReminderD7, MilestoneKind::ReminderD1]
        );
    }

    #[test]
    fn cancel_pending_where_leaves_others() {
        let mut a = account();
        a.schedule(ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None));
        a.schedule(ScheduledMilestone::new(MilestoneKind::ReminderD7, t0().add_days(23), None));

        let cancelled = a.cancel_pending_where(t0(), |m| m.kind.is_end_anchored());

        assert_eq!(cancelled.len(), 1);
        assert_eq!(a.milestones[0].status, MilestoneStatus::Pending);
        assert_eq!(a.milestones[1].status, MilestoneStatus::Cancelled);
    }

    #[test]
    fn activities_stay_chronological() {
        let mut a = account();
        a.push_activity(ActivityRecord::new(ActivityKind::Login, t0().add_days(3)));
        a.push_activity(ActivityRecord::new(ActivityKind::FeatureUsed, t0().add_days(1)));

        assert_eq!(a.activities[0].kind, ActivityKind::FeatureUsed);
        assert_eq!(a.last_activity_at, Some(t0().add_days(3)));
    }

    #[test]
    fn override_on_archived_account_conflicts() {
        let mut a = account();
        a.status = TrialStatus::Archived;
        let err = a
            .override_package(PackageTier::Premium, "vip", t0())
            .unwrap_err();
        assert!(matches!(err, TrialError::StateConflict { .. }));
    }

    #[test]
    fn override_reports_previous_tier() {
        let mut a = account();
        let event = a
            .override_package(PackageTier::Premium, " strategic ", t0())
            .unwrap();
        match event {
            LifecycleEvent::PackageOverridden {
                previous_tier,
                new_tier,
                reason,
                ..
            } => {
                assert_eq!(previous_tier, PackageTier::Plus);
                assert_eq!(new_tier, PackageTier::Premium);
                assert_eq!(reason, "strategic");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(a.package.effective(), PackageTier::Premium);
    }

    #[test]
    fn retention_anchor_uses_latest_of_close_and_activity() {
        let mut a = account();
        assert_eq!(a.retention_anchor(), None);
        a.closed_at = Some(t0().add_days(30));
        a.last_activity_at = Some(t0().add_days(40));
        assert_eq!(a.retention_anchor(), Some(t0().add_days(40)));
    }

    #[test]
    fn round_trips_as_yaml_document() {
        let mut a = account();
        a.schedule(ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None));
        let doc = serde_yaml::to_string(&a).unwrap();
        let back: TrialAccount = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(back.id, a.id);
        assert_eq!(back.milestones.len(), 1);
    }
}
