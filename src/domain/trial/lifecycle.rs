//! TrialLifecycleManager - decides transitions and which milestones exist.
//!
//! Every method mutates one account in memory and returns the events it
//! produced. Persistence, locking and delivery belong to the caller.

use chrono::Duration;

use crate::domain::commission::{CommissionCalculator, CommissionRecord, PartnerAttribution};
use crate::domain::foundation::{Timestamp, ValidationError};

use super::{
    ActivityRecord, CancellationReason, ConversionInfo, LifecycleEvent, MilestoneKind,
    ScheduledMilestone, TrialAccount, TrialError, TrialStatus,
};

/// Timing rules of the trial lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    trial_length: Duration,
    expiring_window: Duration,
    consultant_delay: Duration,
    retention: Duration,
}

impl LifecycleSettings {
    /// # Errors
    ///
    /// - `InvalidFormat` when any duration is not positive
    /// - `InvalidFormat` on `expiring_window` when shorter than the earliest
    ///   reminder offset (7 days), which would stop D-7 from ever firing
    /// - `InvalidFormat` on `expiring_window` when not shorter than the trial
    pub fn new(
        trial_length: Duration,
        expiring_window: Duration,
        consultant_delay: Duration,
        retention: Duration,
    ) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("trial_length", trial_length),
            ("expiring_window", expiring_window),
            ("consultant_delay", consultant_delay),
            ("retention", retention),
        ] {
            if value <= Duration::zero() {
                return Err(ValidationError::invalid_format(field, "must be positive"));
            }
        }
        let earliest_reminder = MilestoneKind::REMINDERS
            .iter()
            .filter_map(|k| k.reminder_offset_days())
            .max()
            .unwrap_or(0);
        if expiring_window < Duration::days(earliest_reminder) {
            return Err(ValidationError::invalid_format(
                "expiring_window",
                format!("must cover the {}-day reminder", earliest_reminder),
            ));
        }
        if expiring_window >= trial_length {
            return Err(ValidationError::invalid_format(
                "expiring_window",
                "must be shorter than the trial length",
            ));
        }
        Ok(Self {
            trial_length,
            expiring_window,
            consultant_delay,
            retention,
        })
    }

    pub fn trial_length(&self) -> Duration {
        self.trial_length
    }

    pub fn expiring_window(&self) -> Duration {
        self.expiring_window
    }

    pub fn consultant_delay(&self) -> Duration {
        self.consultant_delay
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            trial_length: Duration::days(30),
            expiring_window: Duration::days(7),
            consultant_delay: Duration::hours(24),
            retention: Duration::days(90),
        }
    }
}

/// The trial state machine.
#[derive(Debug, Clone, Default)]
pub struct TrialLifecycleManager {
    settings: LifecycleSettings,
    commissions: CommissionCalculator,
}

impl TrialLifecycleManager {
    pub fn new(settings: LifecycleSettings, commissions: CommissionCalculator) -> Self {
        Self {
            settings,
            commissions,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Pending -> Active. Starts the window at `now` and schedules the
    /// welcome, consultant and end-anchored milestones.
    ///
    /// # Errors
    ///
    /// `StateConflict` unless the account is Pending.
    pub fn activate(
        &self,
        account: &mut TrialAccount,
        now: Timestamp,
    ) -> Result<Vec<LifecycleEvent>, TrialError> {
        account.transition_to(TrialStatus::Active, "activate")?;
        account.trial_start_at = now;
        account.trial_duration_secs = self.settings.trial_length.num_seconds();
        account.trial_end_at = now.add_duration(self.settings.trial_length);
        account.updated_at = now;

        account.schedule(ScheduledMilestone::new(MilestoneKind::WelcomeSent, now, None));
        account.schedule(ScheduledMilestone::new(
            MilestoneKind::ConsultantAssigned,
            now.add_duration(self.settings.consultant_delay),
            None,
        ));
        schedule_end_anchored(account, now);

        Ok(vec![LifecycleEvent::Activated {
            trial_id: account.id,
            trial_start_at: account.trial_start_at,
            trial_end_at: account.trial_end_at,
            occurred_at: now,
        }])
    }

    /// Applies every clock-driven transition due at `now`.
    ///
    /// Idempotent: a second call with the same `now` returns no events and
    /// leaves the account unchanged.
    pub fn evaluate(&self, account: &mut TrialAccount, now: Timestamp) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();

        if account.status == TrialStatus::Pending {
            // Normally activated at onboarding; recovers an interrupted one.
            if let Ok(activated) = self.activate(account, now) {
                events.extend(activated);
            }
        }

        if account.status == TrialStatus::Active {
            if now >= account.trial_end_at {
                events.extend(self.expire(account, now));
            } else if now >= account.trial_end_at.minus_duration(self.settings.expiring_window)
                && account.expiring_notified_for != Some(account.trial_end_at)
            {
                account.expiring_notified_for = Some(account.trial_end_at);
                account.updated_at = now;
                events.push(LifecycleEvent::ExpiringWindowEntered {
                    trial_id: account.id,
                    trial_end_at: account.trial_end_at,
                    occurred_at: now,
                });
            }
        }

        if account.status.is_closed() {
            if let Some(anchor) = account.retention_anchor() {
                if now >= anchor.add_duration(self.settings.retention) {
                    events.extend(self.archive(account, now));
                }
            }
        }

        events
    }

    fn expire(&self, account: &mut TrialAccount, now: Timestamp) -> Vec<LifecycleEvent> {
        if account.transition_to(TrialStatus::Expired, "expire").is_err() {
            return Vec::new();
        }
        account.closed_at = Some(now);
        account.updated_at = now;

        let mut events = Vec::new();
        let cancelled =
            account.cancel_pending_where(now, |m| !m.kind.survives(TrialStatus::Expired));
        if !cancelled.is_empty() {
            events.push(LifecycleEvent::MilestonesCancelled {
                trial_id: account.id,
                milestone_ids: cancelled,
                reason: CancellationReason::Expired,
                occurred_at: now,
            });
        }
        events.push(LifecycleEvent::Expired {
            trial_id: account.id,
            trial_end_at: account.trial_end_at,
            occurred_at: now,
        });
        events
    }

    fn archive(&self, account: &mut TrialAccount, now: Timestamp) -> Vec<LifecycleEvent> {
        if account.transition_to(TrialStatus::Archived, "archive").is_err() {
            return Vec::new();
        }
        account.updated_at = now;

        let mut events = Vec::new();
        let cancelled = account.cancel_pending_where(now, |_| true);
        if !cancelled.is_empty() {
            events.push(LifecycleEvent::MilestonesCancelled {
                trial_id: account.id,
                milestone_ids: cancelled,
                reason: CancellationReason::Archived,
                occurred_at: now,
            });
        }
        events.push(LifecycleEvent::Archived {
            trial_id: account.id,
            occurred_at: now,
        });
        events
    }

    /// Marks the account paid. Cancels every unfired milestone, schedules
    /// the conversion notice and, with a partner attribution, creates the
    /// commission record.
    ///
    /// # Errors
    ///
    /// - `StateConflict` from Converted, Expired or Archived, or once `now`
    ///   has reached the trial end
    /// - `Validation` for an attribution with a non-positive deal value
    pub fn convert(
        &self,
        account: &mut TrialAccount,
        attribution: Option<&PartnerAttribution>,
        now: Timestamp,
    ) -> Result<(Vec<LifecycleEvent>, Option<CommissionRecord>), TrialError> {
        if let Some(attribution) = attribution {
            attribution.validate()?;
        }
        ensure_not_lapsed(account, now, "convert")?;
        account.transition_to(TrialStatus::Converted, "convert")?;
        account.closed_at = Some(now);
        account.updated_at = now;

        let mut events = Vec::new();
        let cancelled = account.cancel_pending_where(now, |_| true);
        if !cancelled.is_empty() {
            events.push(LifecycleEvent::MilestonesCancelled {
                trial_id: account.id,
                milestone_ids: cancelled,
                reason: CancellationReason::Converted,
                occurred_at: now,
            });
        }
        account.schedule(ScheduledMilestone::new(
            MilestoneKind::ConvertedNotice,
            now,
            None,
        ));

        let commission = attribution
            .map(|a| CommissionRecord::create(&self.commissions, account.id, a, now));

        account.conversion = Some(ConversionInfo {
            converted_at: now,
            partner_id: attribution.map(|a| a.partner_id.clone()),
            partner_tier: attribution.map(|a| a.partner_tier),
            commission_id: commission.as_ref().map(|c| *c.id()),
        });

        events.push(LifecycleEvent::Converted {
            trial_id: account.id,
            partner_id: attribution.map(|a| a.partner_id.clone()),
            partner_tier: attribution.map(|a| a.partner_tier),
            commission_id: commission.as_ref().map(|c| *c.id()),
            commission_amount: commission.as_ref().map(|c| c.amount()),
            occurred_at: now,
        });

        Ok((events, commission))
    }

    /// Moves the trial end to `new_end`.
    ///
    /// Cancels every pending milestone anchored to the old end first, then
    /// schedules reminders and the expiry notice for the new end.
    ///
    /// # Errors
    ///
    /// - `StateConflict` unless the account is Active and `now` is before
    ///   the current end
    /// - `Validation` when `new_end` is not after both the current end and `now`
    pub fn extend(
        &self,
        account: &mut TrialAccount,
        new_end: Timestamp,
        now: Timestamp,
    ) -> Result<Vec<LifecycleEvent>, TrialError> {
        if account.status != TrialStatus::Active {
            return Err(TrialError::state_conflict(account.status, "extend"));
        }
        ensure_not_lapsed(account, now, "extend")?;
        if new_end <= account.trial_end_at || new_end <= now {
            return Err(ValidationError::invalid_format(
                "new_end",
                format!(
                    "must be after the current end {} and now {}",
                    account.trial_end_at, now
                ),
            )
            .into());
        }
        account.transition_to(TrialStatus::Active, "extend")?;

        let previous_end = account.trial_end_at;
        let mut events = Vec::new();
        let cancelled = account.cancel_pending_where(now, |m| m.anchor == Some(previous_end));
        if !cancelled.is_empty() {
            events.push(LifecycleEvent::MilestonesCancelled {
                trial_id: account.id,
                milestone_ids: cancelled,
                reason: CancellationReason::Extended,
                occurred_at: now,
            });
        }

        account.trial_end_at = new_end;
        account.trial_duration_secs = new_end.duration_since(&account.trial_start_at).num_seconds();
        account.extension_count += 1;
        account.updated_at = now;
        schedule_end_anchored(account, now);

        events.push(LifecycleEvent::Extended {
            trial_id: account.id,
            previous_end_at: previous_end,
            new_end_at: new_end,
            occurred_at: now,
        });
        Ok(events)
    }

    /// Appends an activity record.
    ///
    /// # Errors
    ///
    /// - `StateConflict` on an archived account
    /// - `Validation` for a future timestamp or an overlong detail
    pub fn record_activity(
        &self,
        account: &mut TrialAccount,
        record: ActivityRecord,
        now: Timestamp,
    ) -> Result<LifecycleEvent, TrialError> {
        account.ensure_not_archived("record activity on")?;
        record.validate(now)?;

        let event = LifecycleEvent::ActivityRecorded {
            trial_id: account.id,
            kind: record.kind,
            activity_at: record.occurred_at,
            occurred_at: now,
        };
        account.push_activity(record);
        account.updated_at = now;
        Ok(event)
    }
}

/// An Active account whose end has passed is Expired whether or not a tick
/// has recorded it yet.
fn ensure_not_lapsed(
    account: &TrialAccount,
    now: Timestamp,
    attempted: &'static str,
) -> Result<(), TrialError> {
    if account.status == TrialStatus::Active && now >= account.trial_end_at {
        return Err(TrialError::state_conflict(TrialStatus::Expired, attempted));
    }
    Ok(())
}

/// Schedules D-7, D-3, D-1 and the expiry notice for the current end.
/// Reminders whose due time has already passed are skipped.
fn schedule_end_anchored(account: &mut TrialAccount, now: Timestamp) {
    let end = account.trial_end_at;
    for kind in MilestoneKind::REMINDERS {
        let Some(days) = kind.reminder_offset_days() else {
            continue;
        };
        let due = end.minus_days(days);
        if due >= now {
            account.schedule(ScheduledMilestone::new(kind, due, Some(end)));
        }
    }
    account.schedule(ScheduledMilestone::new(
        MilestoneKind::ExpiredNotice,
        end,
        Some(end),
    ));
}
