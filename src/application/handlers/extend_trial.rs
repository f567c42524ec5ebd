//! ExtendTrialHandler - moves an active trial's end date later.

use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::domain::foundation::{Timestamp, TrialId};
use crate::domain::trial::{TrialAccount, TrialError, TrialLifecycleManager};
use crate::ports::{Clock, TrialRepository};

use super::load_account;

#[derive(Debug, Clone, Copy)]
pub struct ExtendTrialCommand {
    pub trial_id: TrialId,
    pub new_end: Timestamp,
}

pub struct ExtendTrialHandler {
    repository: Arc<dyn TrialRepository>,
    locks: Arc<AccountLocks>,
    lifecycle: Arc<TrialLifecycleManager>,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl ExtendTrialHandler {
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
    /// - `StateConflict` unless the trial is Active and not yet past its end
    /// - `Validation` when `new_end` is not after both the current end and now
    pub async fn handle(&self, cmd: ExtendTrialCommand) -> Result<TrialAccount, TrialError> {
        let (account, events) = {
            let _guard = self.locks.acquire(cmd.trial_id).await;
            let now = self.clock.now();
            let mut account = load_account(self.repository.as_ref(), cmd.trial_id).await?;
            let events = self.lifecycle.extend(&mut account, cmd.new_end, now)?;
            self.repository.update(&account).await?;
            (account, events)
        };

        tracing::info!(
            trial_id = %cmd.trial_id,
            new_end = %cmd.new_end,
            extensions = account.extension_count,
            "trial extended"
        );
        self.events.publish(&events).await;
        Ok(account)
    }
}
