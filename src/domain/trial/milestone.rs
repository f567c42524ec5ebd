//! Scheduled milestones owned by a trial account.
//!
//! A milestone is a one-shot notification. It is created Pending, moves to
//! Sent, Failed or Cancelled exactly once, and is never deleted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{MilestoneId, Timestamp};
use crate::domain::notification::{DeliveryError, RetryPolicy};

use super::{TrialPhase, TrialStatus};

/// What a milestone announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    WelcomeSent,
    ConsultantAssigned,
    ReminderD7,
    ReminderD3,
    ReminderD1,
    ExpiredNotice,
    ConvertedNotice,
}

impl MilestoneKind {
    /// Reminder kinds, furthest from the end first.
    pub const REMINDERS: [MilestoneKind; 3] = [
        MilestoneKind::ReminderD7,
        MilestoneKind::ReminderD3,
        MilestoneKind::ReminderD1,
    ];

    /// Days before the trial end a reminder is due.
    pub fn reminder_offset_days(&self) -> Option<i64> {
        match self {
            MilestoneKind::ReminderD7 => Some(7),
            MilestoneKind::ReminderD3 => Some(3),
            MilestoneKind::ReminderD1 => Some(1),
            _ => None,
        }
    }

    /// True when the due time is computed from the trial end.
    pub fn is_end_anchored(&self) -> bool {
        self.reminder_offset_days().is_some() || *self == MilestoneKind::ExpiredNotice
    }

    /// Whether the account's current phase lets this kind fire.
    pub fn may_fire_in(&self, phase: TrialPhase) -> bool {
        match self {
            MilestoneKind::WelcomeSent | MilestoneKind::ConsultantAssigned => {
                matches!(phase, TrialPhase::Active | TrialPhase::Expiring)
            }
            MilestoneKind::ReminderD7 | MilestoneKind::ReminderD3 | MilestoneKind::ReminderD1 => {
                phase == TrialPhase::Expiring
            }
            MilestoneKind::ExpiredNotice => phase == TrialPhase::Expired,
            MilestoneKind::ConvertedNotice => phase == TrialPhase::Converted,
        }
    }

    /// Whether a still-pending milestone of this kind can ever fire once the
    /// account has reached `status`.
    pub fn survives(&self, status: TrialStatus) -> bool {
        match status {
            TrialStatus::Pending | TrialStatus::Active => true,
            TrialStatus::Expired => *self == MilestoneKind::ExpiredNotice,
            TrialStatus::Converted => *self == MilestoneKind::ConvertedNotice,
            TrialStatus::Archived => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneKind::WelcomeSent => "welcome_sent",
            MilestoneKind::ConsultantAssigned => "consultant_assigned",
            MilestoneKind::ReminderD7 => "reminder_d7",
            MilestoneKind::ReminderD3 => "reminder_d3",
            MilestoneKind::ReminderD1 => "reminder_d1",
            MilestoneKind::ExpiredNotice => "expired_notice",
            MilestoneKind::ConvertedNotice => "converted_notice",
        }
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Sent,
    Failed,
    Cancelled,
}

/// An attempt handed to the notifier whose outcome is not yet recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightAttempt {
    pub attempt: u32,
    /// After this instant the attempt is presumed lost and is re-dispatched
    /// with the same attempt number.
    pub lease_until: Timestamp,
}

/// How a recorded delivery outcome resolved the milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResolution {
    Delivered,
    RetryScheduled {
        next_attempt_at: Timestamp,
        error: String,
    },
    Exhausted {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMilestone {
    pub id: MilestoneId,
    pub kind: MilestoneKind,
    pub due_at: Timestamp,
    /// Trial end the due time was derived from, for end-anchored kinds.
    pub anchor: Option<Timestamp>,
    pub status: MilestoneStatus,
    pub attempt_count: u32,
    pub next_attempt_at: Option<Timestamp>,
    pub in_flight: Option<InFlightAttempt>,
    pub last_error: Option<String>,
    /// Set once retries are exhausted; cleared never.
    pub needs_follow_up: bool,
    pub sent_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl ScheduledMilestone {
    pub fn new(kind: MilestoneKind, due_at: Timestamp, anchor: Option<Timestamp>) -> Self {
        Self {
            id: MilestoneId::new(),
            kind,
            due_at,
            anchor,
            status: MilestoneStatus::Pending,
            attempt_count: 0,
            next_attempt_at: None,
            in_flight: None,
            last_error: None,
            needs_follow_up: false,
            sent_at: None,
            cancelled_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MilestoneStatus::Pending
    }

    /// Pending with its due time reached.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.is_pending() && self.due_at <= now
    }

    /// Due, out of backoff, and not held by a live lease.
    pub fn is_ready(&self, now: Timestamp) -> bool {
        self.is_due(now)
            && self.next_attempt_at.map_or(true, |at| at <= now)
            && self.in_flight.map_or(true, |f| f.lease_until <= now)
    }

    /// Marks an attempt in flight and returns its attempt number.
    ///
    /// A lapsed lease is renewed with the same attempt number so the
    /// notifier sees the same dedup key again.
    pub fn begin_attempt(&mut self, lease_until: Timestamp) -> u32 {
        let attempt = match self.in_flight {
            Some(lost) => lost.attempt,
            None => {
                self.attempt_count += 1;
                self.attempt_count
            }
        };
        self.in_flight = Some(InFlightAttempt {
            attempt,
            lease_until,
        });
        attempt
    }

    /// Records the outcome of `attempt`.
    ///
    /// Returns `None` when the outcome is stale: the milestone is no longer
    /// pending, or a different attempt is in flight.
    pub fn complete_attempt(
        &mut self,
        attempt: u32,
        outcome: &Result<(), DeliveryError>,
        policy: &RetryPolicy,
        now: Timestamp,
    ) -> Option<AttemptResolution> {
        if !self.is_pending() || self.in_flight.map(|f| f.attempt) != Some(attempt) {
            return None;
        }
        self.in_flight = None;

        match outcome {
            Ok(()) => {
                self.status = MilestoneStatus::Sent;
                self.sent_at = Some(now);
                self.next_attempt_at = None;
                Some(AttemptResolution::Delivered)
            }
            Err(err) => {
                let error = err.to_string();
                self.last_error = Some(error.clone());
                if err.is_retryable() && policy.allows_retry_after(attempt) {
                    let next_attempt_at = now.add_duration(policy.backoff_after(attempt));
                    self.next_attempt_at = Some(next_attempt_at);
                    Some(AttemptResolution::RetryScheduled {
                        next_attempt_at,
                        error,
                    })
                } else {
                    self.status = MilestoneStatus::Failed;
                    self.needs_follow_up = true;
                    self.next_attempt_at = None;
                    Some(AttemptResolution::Exhausted { error })
                }
            }
        }
    }

    /// Cancels a pending milestone. Returns false if it had already resolved.
    pub fn cancel(&mut self, at: Timestamp) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = MilestoneStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.in_flight = None;
        self.next_attempt_at = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap())
    }

    fn lease() -> Timestamp {
        t0().add_duration(Duration::seconds(70))
    }

    fn unavailable() -> Result<(), DeliveryError> {
        Err(DeliveryError::Unavailable("smtp down".to_string()))
    }

    #[test]
    fn reminders_only_fire_in_expiring_phase() {
        assert!(MilestoneKind::ReminderD3.may_fire_in(TrialPhase::Expiring));
        assert!(!MilestoneKind::ReminderD3.may_fire_in(TrialPhase::Active));
        assert!(!MilestoneKind::ReminderD3.may_fire_in(TrialPhase::Expired));
        assert!(MilestoneKind::WelcomeSent.may_fire_in(TrialPhase::Expiring));
        assert!(MilestoneKind::ExpiredNotice.may_fire_in(TrialPhase::Expired));
        assert!(!MilestoneKind::ExpiredNotice.may_fire_in(TrialPhase::Converted));
    }

    #[test]
    fn end_anchored_kinds() {
        assert!(MilestoneKind::ReminderD1.is_end_anchored());
        assert!(MilestoneKind::ExpiredNotice.is_end_anchored());
        assert!(!MilestoneKind::ConsultantAssigned.is_end_anchored());
    }

    #[test]
    fn ready_respects_backoff_and_lease() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        assert!(m.is_ready(t0()));

        let attempt = m.begin_attempt(lease());
        assert_eq!(attempt, 1);
        assert!(!m.is_ready(t0()));
        assert!(m.is_ready(lease()));
    }

    #[test]
    fn lapsed_lease_reuses_attempt_number() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        assert_eq!(m.begin_attempt(lease()), 1);
        assert_eq!(m.begin_attempt(lease().add_hours(1)), 1);
        assert_eq!(m.attempt_count, 1);
    }

    #[test]
    fn success_marks_sent() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let attempt = m.begin_attempt(lease());
        let res = m.complete_attempt(attempt, &Ok(()), &RetryPolicy::default(), t0());

        assert_eq!(res, Some(AttemptResolution::Delivered));
        assert_eq!(m.status, MilestoneStatus::Sent);
        assert_eq!(m.sent_at, Some(t0()));
        assert!(m.in_flight.is_none());
    }

    #[test]
    fn transient_failure_schedules_backoff() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let attempt = m.begin_attempt(lease());
        let res = m.complete_attempt(attempt, &unavailable(), &RetryPolicy::default(), t0());

        let expected = t0().add_duration(Duration::seconds(60));
        assert!(matches!(
            res,
            Some(AttemptResolution::RetryScheduled { next_attempt_at, .. }) if next_attempt_at == expected
        ));
        assert!(m.is_pending());
        assert!(!m.is_ready(t0()));
        assert!(m.is_ready(expected));
    }

    #[test]
    fn exhausting_attempts_flags_follow_up() {
        let policy = RetryPolicy::default();
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let mut now = t0();
        let mut last = None;
        for _ in 0..3 {
            let attempt = m.begin_attempt(now.add_hours(1));
            last = m.complete_attempt(attempt, &unavailable(), &policy, now);
            now = now.add_hours(2);
        }

        assert!(matches!(last, Some(AttemptResolution::Exhausted { .. })));
        assert_eq!(m.status, MilestoneStatus::Failed);
        assert!(m.needs_follow_up);
        assert_eq!(m.attempt_count, 3);
    }

    #[test]
    fn rejection_is_not_retried() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let attempt = m.begin_attempt(lease());
        let res = m.complete_attempt(
            attempt,
            &Err(DeliveryError::Rejected("bad address".to_string())),
            &RetryPolicy::default(),
            t0(),
        );
        assert!(matches!(res, Some(AttemptResolution::Exhausted { .. })));
        assert!(m.needs_follow_up);
    }

    #[test]
    fn stale_outcome_is_ignored() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let attempt = m.begin_attempt(lease());
        assert!(m
            .complete_attempt(attempt + 1, &Ok(()), &RetryPolicy::default(), t0())
            .is_none());

        m.cancel(t0());
        assert!(m
            .complete_attempt(attempt, &Ok(()), &RetryPolicy::default(), t0())
            .is_none());
        assert_eq!(m.status, MilestoneStatus::Cancelled);
    }

    #[test]
    fn cancel_only_affects_pending() {
        let mut m = ScheduledMilestone::new(MilestoneKind::WelcomeSent, t0(), None);
        let attempt = m.begin_attempt(lease());
        m.complete_attempt(attempt, &Ok(()), &RetryPolicy::default(), t0());
        assert!(!m.cancel(t0()));
        assert_eq!(m.status, MilestoneStatus::Sent);
    }
}
