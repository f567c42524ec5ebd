//! NotificationScheduler - decides when a milestone is (re)attempted.
//!
//! Delivery is split into three steps so the account lock is never held
//! while a notifier is waiting on the network:
//!
//! 1. `prepare` (under the lock): pick ready milestones and mark each
//!    attempt in flight with a lease
//! 2. `attempt` (no lock): call the notifier, bounded by the send timeout
//! 3. `apply_outcome` (under the lock): record Sent, a retry, or Failed
//!
//! The dedup key `"{milestone_id}:{attempt}"` is stable across restarts:
//! an attempt whose outcome was never recorded is re-dispatched with the
//! same attempt number once its lease lapses.

use chrono::Duration;
use std::sync::Arc;

use crate::domain::foundation::{MilestoneId, Timestamp};
use crate::domain::notification::{DeliveryError, DeliveryRequest, RetryPolicy};
use crate::domain::trial::{AttemptResolution, LifecycleEvent, ScheduledMilestone, TrialAccount};
use crate::ports::Notifier;

pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    send_timeout: std::time::Duration,
    expiring_window: Duration,
}

impl NotificationScheduler {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        policy: RetryPolicy,
        send_timeout: std::time::Duration,
        expiring_window: Duration,
    ) -> Self {
        Self {
            notifier,
            policy,
            send_timeout,
            expiring_window,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn send_timeout(&self) -> std::time::Duration {
        self.send_timeout
    }

    /// Pending milestones whose due time has passed, that are out of
    /// backoff, not held by a live lease, and allowed in the account's
    /// current phase.
    pub fn due<'a>(&self, account: &'a TrialAccount, now: Timestamp) -> Vec<&'a ScheduledMilestone> {
        let phase = account.phase(now, self.expiring_window);
        account
            .milestones
            .iter()
            .filter(|m| m.is_ready(now) && m.kind.may_fire_in(phase))
            .collect()
    }

    /// Marks every due milestone in flight and returns one request per
    /// attempt. The caller must persist the account before sending.
    pub fn prepare(&self, account: &mut TrialAccount, now: Timestamp) -> Vec<DeliveryRequest> {
        let due: Vec<MilestoneId> = self.due(account, now).iter().map(|m| m.id).collect();
        if due.is_empty() {
            return Vec::new();
        }

        let lease_until = now.add_duration(self.lease());
        let mut started = Vec::with_capacity(due.len());
        for id in due {
            if let Some(milestone) = account.milestone_mut(&id) {
                started.push((id, milestone.begin_attempt(lease_until)));
            }
        }
        account.updated_at = now;

        started
            .into_iter()
            .filter_map(|(id, attempt)| {
                let milestone = account.milestone(&id)?;
                Some(DeliveryRequest::for_milestone(account, milestone, attempt))
            })
            .collect()
    }

    /// Sends one attempt. Exceeding the send timeout is a failed attempt.
    pub async fn attempt(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.send_timeout, self.notifier.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DeliveryError::Timeout(self.timeout_ms())),
        }
    }

    /// Records the outcome of `request` on the account.
    ///
    /// Returns `None` for a stale outcome: the milestone was cancelled or
    /// resolved meanwhile, or a newer attempt is in flight.
    pub fn apply_outcome(
        &self,
        account: &mut TrialAccount,
        request: &DeliveryRequest,
        outcome: &Result<(), DeliveryError>,
        now: Timestamp,
    ) -> Option<LifecycleEvent> {
        let trial_id = account.id;
        let milestone = account.milestone_mut(&request.milestone_id)?;
        let kind = milestone.kind;
        let resolution = milestone.complete_attempt(request.attempt, outcome, &self.policy, now);
        let Some(resolution) = resolution else {
            tracing::debug!(
                trial_id = %trial_id,
                milestone_id = %request.milestone_id,
                attempt = request.attempt,
                "discarding stale delivery outcome"
            );
            return None;
        };
        account.updated_at = now;

        let event = match resolution {
            AttemptResolution::Delivered => LifecycleEvent::MilestoneDelivered {
                trial_id,
                milestone_id: request.milestone_id,
                kind,
                attempt: request.attempt,
                occurred_at: now,
            },
            AttemptResolution::RetryScheduled {
                next_attempt_at,
                error,
            } => {
                tracing::warn!(
                    trial_id = %trial_id,
                    milestone = ?kind,
                    attempt = request.attempt,
                    next_attempt_at = %next_attempt_at,
                    error = %error,
                    "milestone delivery failed, retry scheduled"
                );
                LifecycleEvent::MilestoneRetryScheduled {
                    trial_id,
                    milestone_id: request.milestone_id,
                    kind,
                    attempt: request.attempt,
                    next_attempt_at,
                    error,
                    occurred_at: now,
                }
            }
            AttemptResolution::Exhausted { error } => {
                tracing::error!(
                    trial_id = %trial_id,
                    milestone = ?kind,
                    attempts = request.attempt,
                    error = %error,
                    "milestone delivery exhausted, manual follow-up required"
                );
                LifecycleEvent::MilestoneDeliveryFailed {
                    trial_id,
                    milestone_id: request.milestone_id,
                    kind,
                    attempts: request.attempt,
                    error,
                    occurred_at: now,
                }
            }
        };
        Some(event)
    }

    /// How long an attempt may stay in flight before it is presumed lost.
    fn lease(&self) -> Duration {
        Duration::from_std(self.send_timeout).unwrap_or_else(|_| Duration::zero())
            + self.policy.base_backoff()
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::package::{PackageAssignment, PackageTier};
    use crate::domain::profile::{CompanyProfile, EmployeeCountBucket, Industry, SourceChannel};
    use crate::domain::risk::RiskAssessmentEngine;
    use crate::domain::trial::{MilestoneKind, MilestoneStatus, TrialLifecycleManager};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct ScriptedNotifier {
        outcomes: Mutex<Vec<Result<(), DeliveryError>>>,
        sent: Mutex<Vec<DeliveryRequest>>,
        delay: Option<std::time::Duration>,
    }

    impl ScriptedNotifier {
        fn new(outcomes: Vec<Result<(), DeliveryError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                sent: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn slow(delay: std::time::Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(Vec::new())
            }
        }

        fn sent(&self) -> Vec<DeliveryRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for ScriptedNotifier {
        async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().unwrap().push(request.clone());
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                Ok(())
            } else {
                outcomes.remove(0)
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn active_account() -> TrialAccount {
        let profile = CompanyProfile::builder()
            .name("Initech")
            .industry(Industry::Technology)
            .employee_count(EmployeeCountBucket::MidMarket)
            .source_channel(SourceChannel::Direct)
            .build()
            .unwrap();
        let risk = RiskAssessmentEngine::default().assess(&profile, t0()).unwrap();
        let mut account = TrialAccount::new_pending(
            profile,
            risk,
            PackageAssignment::recommended(PackageTier::Plus),
            Duration::days(30),
            t0(),
        );
        TrialLifecycleManager::default()
            .activate(&mut account, t0())
            .unwrap();
        account
    }

    fn scheduler(notifier: Arc<dyn Notifier>) -> NotificationScheduler {
        NotificationScheduler::new(
            notifier,
            RetryPolicy::default(),
            std::time::Duration::from_secs(10),
            Duration::days(7),
        )
    }

    #[test]
    fn due_respects_phase_gating() {
        let account = active_account();
        let s = scheduler(Arc::new(ScriptedNotifier::new(vec![])));

        let kinds: Vec<_> = s.due(&account, t0()).iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MilestoneKind::WelcomeSent]);

        let kinds: Vec<_> = s
            .due(&account, t0().add_days(23))
            .iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                MilestoneKind::WelcomeSent,
                MilestoneKind::ConsultantAssigned,
                MilestoneKind::ReminderD7
            ]
        );
    }

    #[test]
    fn prepare_leases_each_due_milestone_once() {
        let mut account = active_account();
        let s = scheduler(Arc::new(ScriptedNotifier::new(vec![])));

        let requests = s.prepare(&mut account, t0());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].attempt, 1);
        assert_eq!(
            requests[0].dedup_key,
            DeliveryRequest::dedup_key_for(&requests[0].milestone_id, 1)
        );

        // Leased: a second pass at the same instant finds nothing.
        assert!(s.prepare(&mut account, t0()).is_empty());
    }

    #[test]
    fn lapsed_lease_is_redispatched_with_same_dedup_key() {
        let mut account = active_account();
        let s = scheduler(Arc::new(ScriptedNotifier::new(vec![])));

        let first = s.prepare(&mut account, t0());
        let later = t0().add_hours(1);
        let again = s.prepare(&mut account, later);

        assert_eq!(again.len(), 1);
        assert_eq!(again[0].dedup_key, first[0].dedup_key);
    }

    #[tokio::test]
    async fn success_marks_sent() {
        let notifier = Arc::new(ScriptedNotifier::new(vec![Ok(())]));
        let s = scheduler(notifier.clone());
        let mut account = active_account();

        let request = s.prepare(&mut account, t0()).remove(0);
        let outcome = s.attempt(&request).await;
        let event = s.apply_outcome(&mut account, &request, &outcome, t0()).unwrap();

        assert!(matches!(event, LifecycleEvent::MilestoneDelivered { attempt: 1, .. }));
        let m = account.milestone(&request.milestone_id).unwrap();
        assert_eq!(m.status, MilestoneStatus::Sent);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn failures_back_off_then_exhaust() {
        let down = || Err(DeliveryError::Unavailable("smtp down".into()));
        let notifier = Arc::new(ScriptedNotifier::new(vec![down(), down(), down()]));
        let s = scheduler(notifier.clone());
        let mut account = active_account();

        let mut now = t0();
        let mut events = Vec::new();
        for _ in 0..3 {
            let request = s.prepare(&mut account, now).remove(0);
            let outcome = s.attempt(&request).await;
            events.push(s.apply_outcome(&mut account, &request, &outcome, now).unwrap());
            now = now.add_hours(2);
        }

        assert!(matches!(events[0], LifecycleEvent::MilestoneRetryScheduled { attempt: 1, .. }));
        assert!(matches!(events[1], LifecycleEvent::MilestoneRetryScheduled { attempt: 2, .. }));
        assert!(matches!(events[2], LifecycleEvent::MilestoneDeliveryFailed { attempts: 3, .. }));

        let welcome = &account.milestones[0];
        assert_eq!(welcome.status, MilestoneStatus::Failed);
        assert!(welcome.needs_follow_up);
        let welcome_id = welcome.id.clone();
        assert!(s.prepare(&mut account, now.add_days(1)).iter().all(|r| r.milestone_id != welcome_id));
    }

    #[tokio::test]
    async fn backoff_delays_the_next_attempt() {
        let notifier = Arc::new(ScriptedNotifier::new(vec![Err(DeliveryError::Unavailable(
            "x".into(),
        ))]));
        let s = scheduler(notifier);
        let mut account = active_account();

        let request = s.prepare(&mut account, t0()).remove(0);
        let outcome = s.attempt(&request).await;
        s.apply_outcome(&mut account, &request, &outcome, t0());

        assert!(s.prepare(&mut account, t0().add_duration(Duration::seconds(59))).is_empty());
        let retry = s.prepare(&mut account, t0().add_duration(Duration::seconds(60)));
        assert_eq!(retry.len(), 1);
        assert_eq!(retry[0].attempt, 2);
    }

    #[tokio::test]
    async fn rejection_fails_immediately() {
        let notifier = Arc::new(ScriptedNotifier::new(vec![Err(DeliveryError::Rejected(
            "bad address".into(),
        ))]));
        let s = scheduler(notifier);
        let mut account = active_account();

        let request = s.prepare(&mut account, t0()).remove(0);
        let outcome = s.attempt(&request).await;
        let event = s.apply_outcome(&mut account, &request, &outcome, t0()).unwrap();

        assert!(matches!(event, LifecycleEvent::MilestoneDeliveryFailed { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn timeout_counts_as_failed_attempt() {
        let notifier = Arc::new(ScriptedNotifier::slow(std::time::Duration::from_secs(5)));
        let s = NotificationScheduler::new(
            notifier,
            RetryPolicy::default(),
            std::time::Duration::from_millis(20),
            Duration::days(7),
        );
        let mut account = active_account();

        let request = s.prepare(&mut account, t0()).remove(0);
        let outcome = s.attempt(&request).await;
        assert_eq!(outcome, Err(DeliveryError::Timeout(20)));

        let event = s.apply_outcome(&mut account, &request, &outcome, t0()).unwrap();
        assert!(matches!(event, LifecycleEvent::MilestoneRetryScheduled { .. }));
        assert_eq!(account.milestones[0].attempt_count, 1);
    }

    #[tokio::test]
    async fn outcome_for_cancelled_milestone_is_stale() {
        let s = scheduler(Arc::new(ScriptedNotifier::new(vec![])));
        let mut account = active_account();

        let request = s.prepare(&mut account, t0()).remove(0);
        account.cancel_pending_where(t0(), |_| true);

        assert!(s.apply_outcome(&mut account, &request, &Ok(()), t0()).is_none());
        assert_eq!(account.milestones[0].status, MilestoneStatus::Cancelled);
    }
}
