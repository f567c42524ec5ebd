//! RunTickHandler - one evaluation pass over every trial account.
//!
//! Accounts are processed concurrently by a bounded pool. Each account goes
//! through decide/commit under its lock, then delivery without the lock,
//! then a second decide/commit to record outcomes. A failure on one account
//! is logged and skipped; only a failure to enumerate accounts fails the
//! tick.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::application::scheduler::NotificationScheduler;
use crate::domain::foundation::{Timestamp, TrialId};
use crate::domain::trial::{LifecycleEvent, TrialError, TrialLifecycleManager};
use crate::ports::TrialRepository;

use super::load_account;

#[derive(Debug, Clone, Copy)]
pub struct RunTickCommand {
    pub now: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub struct TickResult {
    /// Events from every account, grouped by account in id order.
    pub events: Vec<LifecycleEvent>,
    pub accounts_evaluated: usize,
    pub accounts_failed: usize,
}

pub struct RunTickHandler {
    repository: Arc<dyn TrialRepository>,
    locks: Arc<AccountLocks>,
    lifecycle: Arc<TrialLifecycleManager>,
    scheduler: Arc<NotificationScheduler>,
    events: EventSink,
    worker_pool_size: usize,
}

impl RunTickHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        locks: Arc<AccountLocks>,
        lifecycle: Arc<TrialLifecycleManager>,
        scheduler: Arc<NotificationScheduler>,
        events: EventSink,
        worker_pool_size: usize,
    ) -> Self {
        Self {
            repository,
            locks,
            lifecycle,
            scheduler,
            events,
            worker_pool_size: worker_pool_size.max(1),
        }
    }

    /// # Errors
    ///
    /// `Storage` when the account list cannot be read.
    pub async fn handle(&self, cmd: RunTickCommand) -> Result<TickResult, TrialError> {
        let ids = self.repository.list_ids().await?;
        let accounts_evaluated = ids.len();
        let now = cmd.now;

        let outcomes: Vec<(TrialId, Result<Vec<LifecycleEvent>, TrialError>)> = stream::iter(ids)
            .map(|id| async move { (id, self.tick_account(id, now).await) })
            .buffered(self.worker_pool_size)
            .collect()
            .await;

        let mut result = TickResult {
            accounts_evaluated,
            ..TickResult::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(events) => result.events.extend(events),
                Err(e) => {
                    result.accounts_failed += 1;
                    tracing::error!(trial_id = %id, error = %e, "tick failed for account");
                }
            }
        }

        self.locks.prune().await;
        self.events
            .publish_correlated(&result.events, &format!("tick-{}", now))
            .await;

        tracing::debug!(
            now = %now,
            accounts = result.accounts_evaluated,
            failed = result.accounts_failed,
            events = result.events.len(),
            "tick complete"
        );
        Ok(result)
    }

    async fn tick_account(
        &self,
        id: TrialId,
        now: Timestamp,
    ) -> Result<Vec<LifecycleEvent>, TrialError> {
        // 1. Decide transitions and lease due milestones
        let (mut events, requests) = {
            let _guard = self.locks.acquire(id).await;
            let mut account = load_account(self.repository.as_ref(), id).await?;
            let before = account.clone();

            let events = self.lifecycle.evaluate(&mut account, now);
            let requests = self.scheduler.prepare(&mut account, now);
            if account != before {
                self.repository.update(&account).await?;
            }
            for event in &events {
                log_transition(event);
            }
            (events, requests)
        };
        if requests.is_empty() {
            return Ok(events);
        }

        // 2. Deliver without holding the lock
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.scheduler.attempt(&request).await;
            outcomes.push((request, outcome));
        }

        // 3. Record outcomes
        let _guard = self.locks.acquire(id).await;
        let mut account = load_account(self.repository.as_ref(), id).await?;
        let mut changed = false;
        for (request, outcome) in &outcomes {
            if let Some(event) = self.scheduler.apply_outcome(&mut account, request, outcome, now) {
                events.push(event);
                changed = true;
            }
        }
        if changed {
            self.repository.update(&account).await?;
        }
        Ok(events)
    }
}

fn log_transition(event: &LifecycleEvent) {
    match event {
        LifecycleEvent::Expired {
            trial_id,
            trial_end_at,
            ..
        } => tracing::info!(trial_id = %trial_id, trial_end_at = %trial_end_at, "trial expired"),
        LifecycleEvent::Archived { trial_id, .. } => {
            tracing::info!(trial_id = %trial_id, "trial archived")
        }
        LifecycleEvent::Activated { trial_id, .. } => {
            tracing::info!(trial_id = %trial_id, "pending trial activated")
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        active_account, bus, seeded, t0, BrokenRepository, RecordingNotifier,
    };
    use crate::adapters::InMemoryTrialRepository;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::notification::RetryPolicy;
    use crate::domain::trial::{MilestoneKind, MilestoneStatus, TrialAccount, TrialStatus};
    use crate::ports::Notifier;
    use async_trait::async_trait;

    fn handler(
        repo: Arc<dyn TrialRepository>,
        notifier: Arc<dyn Notifier>,
        events: EventSink,
    ) -> RunTickHandler {
        let scheduler = NotificationScheduler::new(
            notifier,
            RetryPolicy::default(),
            std::time::Duration::from_secs(5),
            chrono::Duration::days(7),
        );
        RunTickHandler::new(
            repo,
            Arc::new(AccountLocks::new()),
            Arc::new(TrialLifecycleManager::default()),
            Arc::new(scheduler),
            events,
            4,
        )
    }

    fn delivered(events: &[LifecycleEvent]) -> Vec<MilestoneKind> {
        events
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::MilestoneDelivered { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn first_tick_sends_welcome() {
        let account = active_account("Hooli");
        let repo = seeded(&account).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = handler(repo.clone(), notifier.clone(), EventSink::disabled());

        let result = handler.handle(RunTickCommand { now: t0() }).await.unwrap();

        assert_eq!(delivered(&result.events), vec![MilestoneKind::WelcomeSent]);
        assert_eq!(notifier.sent().len(), 1);
        let stored = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.milestones[0].status, MilestoneStatus::Sent);
    }

    #[tokio::test]
    async fn repeated_tick_at_same_instant_is_idempotent() {
        let account = active_account("Hooli");
        let repo = seeded(&account).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = handler(repo.clone(), notifier.clone(), EventSink::disabled());
        let now = t0().add_days(23);

        handler.handle(RunTickCommand { now }).await.unwrap();
        let after_first = repo.find_by_id(&account.id).await.unwrap().unwrap();

        let second = handler.handle(RunTickCommand { now }).await.unwrap();
        let after_second = repo.find_by_id(&account.id).await.unwrap().unwrap();

        assert!(second.events.is_empty());
        assert_eq!(after_first, after_second);
        assert_eq!(notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn expiry_sends_notice_once() {
        let account = active_account("Hooli");
        let repo = seeded(&account).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = handler(repo.clone(), notifier.clone(), EventSink::disabled());
        let now = t0().add_days(31);

        let mut all = Vec::new();
        for _ in 0..5 {
            all.extend(handler.handle(RunTickCommand { now }).await.unwrap().events);
        }

        let stored = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TrialStatus::Expired);
        let notices = delivered(&all)
            .into_iter()
            .filter(|k| *k == MilestoneKind::ExpiredNotice)
            .count();
        assert_eq!(notices, 1);
        // Reminders were never sent, so they were cancelled rather than sent late.
        assert!(!delivered(&all).contains(&MilestoneKind::ReminderD7));
    }

    /// Lists one extra id whose load always fails.
    struct OneBadAccount {
        inner: Arc<InMemoryTrialRepository>,
        bad: TrialId,
    }

    #[async_trait]
    impl TrialRepository for OneBadAccount {
        async fn insert(&self, account: &TrialAccount) -> Result<(), DomainError> {
            self.inner.insert(account).await
        }

        async fn update(&self, account: &TrialAccount) -> Result<(), DomainError> {
            self.inner.update(account).await
        }

        async fn find_by_id(&self, id: &TrialId) -> Result<Option<TrialAccount>, DomainError> {
            if *id == self.bad {
                return Err(DomainError::new(ErrorCode::CorruptRecord, "corrupt record"));
            }
            self.inner.find_by_id(id).await
        }

        async fn list_ids(&self) -> Result<Vec<TrialId>, DomainError> {
            let mut ids = self.inner.list_ids().await?;
            ids.push(self.bad);
            Ok(ids)
        }

        async fn list_by_status(&self, status: TrialStatus) -> Result<Vec<TrialAccount>, DomainError> {
            self.inner.list_by_status(status).await
        }

        async fn find_needing_follow_up(&self) -> Result<Vec<TrialAccount>, DomainError> {
            self.inner.find_needing_follow_up().await
        }
    }

    #[tokio::test]
    async fn failing_account_does_not_fail_the_tick() {
        let healthy = active_account("Healthy");
        let repo = Arc::new(OneBadAccount {
            inner: seeded(&healthy).await,
            bad: TrialId::new(),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = handler(repo, notifier.clone(), EventSink::disabled());

        let result = handler.handle(RunTickCommand { now: t0() }).await.unwrap();

        assert_eq!(result.accounts_evaluated, 2);
        assert_eq!(result.accounts_failed, 1);
        assert_eq!(delivered(&result.events), vec![MilestoneKind::WelcomeSent]);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn enumeration_failure_fails_the_tick() {
        let handler = handler(
            Arc::new(BrokenRepository),
            Arc::new(RecordingNotifier::default()),
            EventSink::disabled(),
        );

        let err = handler.handle(RunTickCommand { now: t0() }).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn tick_events_are_published() {
        let account = active_account("Hooli");
        let repo = seeded(&account).await;
        let events = bus();
        let handler = handler(
            repo,
            Arc::new(RecordingNotifier::default()),
            EventSink::new(events.clone()),
        );

        handler.handle(RunTickCommand { now: t0() }).await.unwrap();

        assert!(events.has_event("trial.milestone_delivered.v1"));
    }
}
