//! In-memory CommissionRepository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::commission::CommissionRecord;
use crate::domain::foundation::{DomainError, ErrorCode, PartnerId, TrialId};
use crate::ports::CommissionRepository;

#[derive(Debug, Default)]
pub struct InMemoryCommissionRepository {
    records: RwLock<Vec<CommissionRecord>>,
}

impl InMemoryCommissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<CommissionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl CommissionRepository for InMemoryCommissionRepository {
    async fn insert(&self, record: &CommissionRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.trial_id() == record.trial_id()) {
            return Err(DomainError::new(
                ErrorCode::DuplicateRecord,
                format!("Commission for trial {} already recorded", record.trial_id()),
            ));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn find_by_trial(
        &self,
        trial_id: &TrialId,
    ) -> Result<Option<CommissionRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.trial_id() == trial_id)
            .cloned())
    }

    async fn list_by_partner(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<CommissionRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.partner_id() == partner_id)
            .cloned()
            .collect())
    }
}
