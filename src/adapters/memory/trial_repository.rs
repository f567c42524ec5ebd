//! In-memory TrialRepository.
//!
//! Stores whole accounts in a `BTreeMap`, so listing is ordered by id.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, TrialId};
use crate::domain::trial::{TrialAccount, TrialStatus};
use crate::ports::TrialRepository;

#[derive(Debug, Default)]
pub struct InMemoryTrialRepository {
    accounts: RwLock<BTreeMap<TrialId, TrialAccount>>,
}

impl InMemoryTrialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl TrialRepository for InMemoryTrialRepository {
    async fn insert(&self, account: &TrialAccount) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(DomainError::new(
                ErrorCode::DuplicateRecord,
                format!("Trial {} already exists", account.id),
            ));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &TrialAccount) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::TrialNotFound,
                format!("Trial {} not found", account.id),
            )),
        }
    }

    async fn find_by_id(&self, id: &TrialId) -> Result<Option<TrialAccount>, DomainError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<TrialId>, DomainError> {
        Ok(self.accounts.read().await.keys().copied().collect())
    }

    async fn list_by_status(&self, status: TrialStatus) -> Result<Vec<TrialAccount>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }

    async fn find_needing_follow_up(&self) -> Result<Vec<TrialAccount>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.milestones_needing_follow_up().next().is_some())
            .cloned()
            .collect())
    }
}
