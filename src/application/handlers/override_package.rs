//! OverridePackageHandler - administrative package override.
//!
//! The override wins over the computed recommendation and stays in force
//! through later reassessments. Every override is kept in the account's
//! history with its reason.

use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::domain::foundation::TrialId;
use crate::domain::package::PackageTier;
use crate::domain::trial::{TrialAccount, TrialError};
use crate::ports::{Clock, TrialRepository};

use super::load_account;

#[derive(Debug, Clone)]
pub struct OverridePackageCommand {
    pub trial_id: TrialId,
    pub tier: PackageTier,
    pub reason: String,
}

pub struct OverridePackageHandler {
    repository: Arc<dyn TrialRepository>,
    locks: Arc<AccountLocks>,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl OverridePackageHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        locks: Arc<AccountLocks>,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        Self {
            repository,
            locks,
            clock,
            events,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` for an unknown trial
    /// - `StateConflict` for an archived trial
    /// - `Validation` for a blank or overlong reason
    pub async fn handle(&self, cmd: OverridePackageCommand) -> Result<TrialAccount, TrialError> {
        let (account, event) = {
            let _guard = self.locks.acquire(cmd.trial_id).await;
            let now = self.clock.now();
            let mut account = load_account(self.repository.as_ref(), cmd.trial_id).await?;
            let event = account.override_package(cmd.tier, &cmd.reason, now)?;
            self.repository.update(&account).await?;
            (account, event)
        };

        tracing::info!(
            trial_id = %cmd.trial_id,
            package = %cmd.tier,
            recommended = %account.package.recommendation(),
            reason = %cmd.reason.trim(),
            "package overridden"
        );
        self.events.publish(&[event]).await;
        Ok(account)
    }
}
