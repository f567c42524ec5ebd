//! RecordConversionHandler - marks a trial paid and attributes commission.

use std::sync::Arc;

use crate::application::locks::AccountLocks;
use crate::application::publishing::EventSink;
use crate::domain::commission::{CommissionRecord, PartnerAttribution};
use crate::domain::foundation::TrialId;
use crate::domain::trial::{LifecycleEvent, TrialAccount, TrialError, TrialLifecycleManager};
use crate::ports::{Clock, CommissionRepository, TrialRepository};

use super::load_account;

#[derive(Debug, Clone)]
pub struct RecordConversionCommand {
    pub trial_id: TrialId,
    pub attribution: Option<PartnerAttribution>,
}

#[derive(Debug, Clone)]
pub struct RecordConversionResult {
    pub account: TrialAccount,
    pub commission: Option<CommissionRecord>,
    pub events: Vec<LifecycleEvent>,
}

pub struct RecordConversionHandler {
    repository: Arc<dyn TrialRepository>,
    commissions: Arc<dyn CommissionRepository>,
    locks: Arc<AccountLocks>,
    lifecycle: Arc<TrialLifecycleManager>,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl RecordConversionHandler {
    pub fn new(
        repository: Arc<dyn TrialRepository>,
        commissions: Arc<dyn CommissionRepository>,
        locks: Arc<AccountLocks>,
        lifecycle: Arc<TrialLifecycleManager>,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        Self {
            repository,
            commissions,
            locks,
            lifecycle,
            clock,
            events,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` for an unknown trial
    /// - `StateConflict` once the trial is Converted, Expired or Archived, or
    ///   past its end even if no tick has expired it yet
    /// - `Validation` for an attribution with a non-positive deal value
    /// - `Storage` when the commission or account cannot be persisted
    pub async fn handle(
        &self,
        cmd: RecordConversionCommand,
    ) -> Result<RecordConversionResult, TrialError> {
        let (account, commission, events) = {
            let _guard = self.locks.acquire(cmd.trial_id).await;
            let now = self.clock.now();
            let mut account = load_account(self.repository.as_ref(), cmd.trial_id).await?;

            let (mut events, mut commission) =
                self.lifecycle
                    .convert(&mut account, cmd.attribution.as_ref(), now)?;

            // The commission outlives the trial, so it is written first.
            if let Some(record) = commission.take() {
                commission = match self.commissions.find_by_trial(&account.id).await? {
                    // Left by an earlier attempt whose account write failed
                    Some(existing) => {
                        adopt_commission(&mut account, &mut events, &existing);
                        Some(existing)
                    }
                    None => {
                        self.commissions.insert(&record).await?;
                        Some(record)
                    }
                };
            }
            self.repository.update(&account).await?;
            (account, commission, events)
        };

        match &commission {
            Some(record) => tracing::info!(
                trial_id = %account.id,
                partner_id = %record.partner_id(),
                partner_tier = ?record.partner_tier(),
                deal_value = %record.deal_value(),
                commission = %record.amount(),
                "trial converted with partner commission"
            ),
            None => tracing::info!(trial_id = %account.id, "trial converted"),
        }
        self.events.publish(&events).await;

        Ok(RecordConversionResult {
            account,
            commission,
            events,
        })
    }
}

/// Points the account and its `Converted` event at an already stored record.
fn adopt_commission(
    account: &mut TrialAccount,
    events: &mut [LifecycleEvent],
    existing: &CommissionRecord,
) {
    if let Some(conversion) = account.conversion.as_mut() {
        conversion.commission_id = Some(*existing.id());
    }
    for event in events.iter_mut() {
        if let LifecycleEvent::Converted {
            commission_id,
            commission_amount,
            ..
        } = event
        {
            *commission_id = Some(*existing.id());
            *commission_amount = Some(existing.amount());
        }
    }
}
