//! GetTrialHandler - loads one trial account.

use std::sync::Arc;

use crate::domain::foundation::TrialId;
use crate::domain::trial::{TrialAccount, TrialError};
use crate::ports::TrialRepository;

use super::load_account;

#[derive(Debug, Clone, Copy)]
pub struct GetTrialQuery {
    pub trial_id: TrialId,
}

pub struct GetTrialHandler {
    repository: Arc<dyn TrialRepository>,
}

impl GetTrialHandler {
    pub fn new(repository: Arc<dyn TrialRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetTrialQuery) -> Result<TrialAccount, TrialError> {
        load_account(self.repository.as_ref(), query.trial_id).await
    }
}
