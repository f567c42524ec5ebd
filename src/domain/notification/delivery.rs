//! Delivery request and error types shared by the scheduler and notifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{MilestoneId, Timestamp, TrialId};
use crate::domain::package::PackageTier;
use crate::domain::trial::{MilestoneKind, ScheduledMilestone, TrialAccount};

/// Failure reported by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Transport or downstream service unavailable. Retried.
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    /// The attempt exceeded the send timeout. Retried.
    #[error("delivery timed out after {0}ms")]
    Timeout(u64),

    /// Permanently refused, e.g. an invalid recipient. Not retried.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DeliveryError::Rejected(_))
    }
}

/// Everything a notifier needs to send one milestone attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// `"{milestone_id}:{attempt}"`; identical across re-dispatches of the
    /// same attempt.
    pub dedup_key: String,
    pub milestone_id: MilestoneId,
    pub attempt: u32,
    pub trial_id: TrialId,
    pub kind: MilestoneKind,
    pub company_name: String,
    pub package_tier: PackageTier,
    pub trial_end_at: Timestamp,
    pub due_at: Timestamp,
}

impl DeliveryRequest {
    pub fn dedup_key_for(milestone_id: &MilestoneId, attempt: u32) -> String {
        format!("{}:{}", milestone_id, attempt)
    }

    pub fn for_milestone(
        account: &TrialAccount,
        milestone: &ScheduledMilestone,
        attempt: u32,
    ) -> Self {
        Self {
            dedup_key: Self::dedup_key_for(&milestone.id, attempt),
            milestone_id: milestone.id,
            attempt,
            trial_id: account.id,
            kind: milestone.kind,
            company_name: account.profile.name.clone(),
            package_tier: account.package.effective(),
            trial_end_at: account.trial_end_at,
            due_at: milestone.due_at,
        }
    }
}
