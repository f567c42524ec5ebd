//! RecordActivityHandler - appends an activity and advances
//! `last_activity_at`.

use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::domain::foundation::TrialId;
use crate::domain::trial::{ActivityRecord, TrialError, TrialLifecycleManager};
use crate::ports::{Clock, TrialRepository};

use super::load_account;

#[derive(Debug, Clone)]
pub struct RecordActivityCommand {
    pub trial_id: TrialId,
    pub activity: ActivityRecord,
}

pub struct RecordActivityHandler {
    repository: Arc<dyn TrialRepository>,
    locks: Arc<AccountLocks>,
    lifecycle: Arc<TrialLifecycleManager>,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl RecordActivityHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        locks: Arc<AccountLocks>,
        lifecycle: Arc<TrialLifecycleManager>,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        Self {
            repository,
            locks,
            lifecycle,
            clock,
            events,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` for an unknown trial
    /// - `StateConflict` for an archived trial
    /// - `Validation` for an activity in the future or an overlong detail
    pub async fn handle(&self, cmd: RecordActivityCommand) -> Result<(), TrialError> {
        let event = {
            let _guard = self.locks.acquire(cmd.trial_id).await;
            let now = self.clock.now();
            let mut account = load_account(self.repository.as_ref(), cmd.trial_id).await?;
            let event = self
                .lifecycle
                .record_activity(&mut account, cmd.activity, now)?;
            self.repository.update(&account).await?;
            event
        };

        tracing::debug!(trial_id = %cmd.trial_id, "activity recorded");
        self.events.publish(&[event]).await;
        Ok(())
    }
}
