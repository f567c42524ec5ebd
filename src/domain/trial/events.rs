//! Lifecycle events emitted by trial operations and ticks.
//!
//! Events are named in past tense: they describe something that has
//! already been committed to the account.

use serde::{Deserialize, Serialize};

use crate::domain::commission::PartnerTier;
use crate::domain::foundation::{
    CommissionId, DomainEvent, Money, MilestoneId, PartnerId, Timestamp, TrialId,
};
use crate::domain::package::PackageTier;
use crate::domain::risk::RiskCategory;

use super::{ActivityKind, MilestoneKind};

/// Why a batch of milestones was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    Converted,
    Extended,
    Expired,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Onboarded {
        trial_id: TrialId,
        company_name: String,
        package_tier: PackageTier,
        risk_score: f64,
        risk_category: RiskCategory,
        occurred_at: Timestamp,
    },

    /// Pending -> Active.
    Activated {
        trial_id: TrialId,
        trial_start_at: Timestamp,
        trial_end_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// Entered the final window before `trial_end_at`. Once per end date.
    ExpiringWindowEntered {
        trial_id: TrialId,
        trial_end_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// Active -> Expired.
    Expired {
        trial_id: TrialId,
        trial_end_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// Pending/Active -> Converted.
    Converted {
        trial_id: TrialId,
        partner_id: Option<PartnerId>,
        partner_tier: Option<PartnerTier>,
        commission_id: Option<CommissionId>,
        commission_amount: Option<Money>,
        occurred_at: Timestamp,
    },

    /// Active -> Active with a later end.
    Extended {
        trial_id: TrialId,
        previous_end_at: Timestamp,
        new_end_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// Expired/Converted -> Archived.
    Archived {
        trial_id: TrialId,
        occurred_at: Timestamp,
    },

    PackageOverridden {
        trial_id: TrialId,
        previous_tier: PackageTier,
        new_tier: PackageTier,
        reason: String,
        occurred_at: Timestamp,
    },

    RiskReassessed {
        trial_id: TrialId,
        score: f64,
        category: RiskCategory,
        recommended_tier: PackageTier,
        occurred_at: Timestamp,
    },

    MilestoneDelivered {
        trial_id: TrialId,
        milestone_id: MilestoneId,
        kind: MilestoneKind,
        attempt: u32,
        occurred_at: Timestamp,
    },

    MilestoneRetryScheduled {
        trial_id: TrialId,
        milestone_id: MilestoneId,
        kind: MilestoneKind,
        attempt: u32,
        next_attempt_at: Timestamp,
        error: String,
        occurred_at: Timestamp,
    },

    /// Retries exhausted; the milestone now needs manual follow-up.
    MilestoneDeliveryFailed {
        trial_id: TrialId,
        milestone_id: MilestoneId,
        kind: MilestoneKind,
        attempts: u32,
        error: String,
        occurred_at: Timestamp,
    },

    MilestonesCancelled {
        trial_id: TrialId,
        milestone_ids: Vec<MilestoneId>,
        reason: CancellationReason,
        occurred_at: Timestamp,
    },

    ActivityRecorded {
        trial_id: TrialId,
        kind: ActivityKind,
        activity_at: Timestamp,
        occurred_at: Timestamp,
    },
}

impl LifecycleEvent {
    pub fn trial_id(&self) -> TrialId {
        match self {
            LifecycleEvent::Onboarded { trial_id, .. }
            | LifecycleEvent::Activated { trial_id, .. }
            | LifecycleEvent::ExpiringWindowEntered { trial_id, .. }
            | LifecycleEvent::Expired { trial_id, .. }
            | LifecycleEvent::Converted { trial_id, .. }
            | LifecycleEvent::Extended { trial_id, .. }
            | LifecycleEvent::Archived { trial_id, .. }
            | LifecycleEvent::PackageOverridden { trial_id, .. }
            | LifecycleEvent::RiskReassessed { trial_id, .. }
            | LifecycleEvent::MilestoneDelivered { trial_id, .. }
            | LifecycleEvent::MilestoneRetryScheduled { trial_id, .. }
            | LifecycleEvent::MilestoneDeliveryFailed { trial_id, .. }
            | LifecycleEvent::MilestonesCancelled { trial_id, .. }
            | LifecycleEvent::ActivityRecorded { trial_id, .. } => *trial_id,
        }
    }

    /// Kind of the milestone this event reports on, if any.
    pub fn milestone_kind(&self) -> Option<MilestoneKind> {
        match self {
            LifecycleEvent::MilestoneDelivered { kind, .. }
            | LifecycleEvent::MilestoneRetryScheduled { kind, .. }
            | LifecycleEvent::MilestoneDeliveryFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for a successful delivery of `kind`.
    pub fn is_delivery_of(&self, kind: MilestoneKind) -> bool {
        matches!(self, LifecycleEvent::MilestoneDelivered { kind: k, .. } if *k == kind)
    }
}

impl DomainEvent for LifecycleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::Onboarded { .. } => "trial.onboarded.v1",
            LifecycleEvent::Activated { .. } => "trial.activated.v1",
            LifecycleEvent::ExpiringWindowEntered { .. } => "trial.expiring_window_entered.v1",
            LifecycleEvent::Expired { .. } => "trial.expired.v1",
            LifecycleEvent::Converted { .. } => "trial.converted.v1",
            LifecycleEvent::Extended { .. } => "trial.extended.v1",
            LifecycleEvent::Archived { .. } => "trial.archived.v1",
            LifecycleEvent::PackageOverridden { .. } => "trial.package_overridden.v1",
            LifecycleEvent::RiskReassessed { .. } => "trial.risk_reassessed.v1",
            LifecycleEvent::MilestoneDelivered { .. } => "trial.milestone_delivered.v1",
            LifecycleEvent::MilestoneRetryScheduled { .. } => "trial.milestone_retry_scheduled.v1",
            LifecycleEvent::MilestoneDeliveryFailed { .. } => "trial.milestone_delivery_failed.v1",
            LifecycleEvent::MilestonesCancelled { .. } => "trial.milestones_cancelled.v1",
            LifecycleEvent::ActivityRecorded { .. } => "trial.activity_recorded.v1",
        }
    }

    fn aggregate_id(&self) -> String {
        self.trial_id().to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "TrialAccount"
    }

    fn occurred_at(&self) -> Timestamp {
        match self {
            LifecycleEvent::Onboarded { occurred_at, .. }
            | LifecycleEvent::Activated { occurred_at, .. }
            | LifecycleEvent::ExpiringWindowEntered { occurred_at, .. }
            | LifecycleEvent::Expired { occurred_at, .. }
            | LifecycleEvent::Converted { occurred_at, .. }
            | LifecycleEvent::Extended { occurred_at, .. }
            | LifecycleEvent::Archived { occurred_at, .. }
            | LifecycleEvent::PackageOverridden { occurred_at, .. }
            | LifecycleEvent::RiskReassessed { occurred_at, .. }
            | LifecycleEvent::MilestoneDelivered { occurred_at, .. }
            | LifecycleEvent::MilestoneRetryScheduled { occurred_at, .. }
            | LifecycleEvent::MilestoneDeliveryFailed { occurred_at, .. }
            | LifecycleEvent::MilestonesCancelled { occurred_at, .. }
            | LifecycleEvent::ActivityRecorded { occurred_at, .. } => *occurred_at,
        }
    }
}
