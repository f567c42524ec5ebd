//! CommissionRepository port - Append-only store of commission records.

use async_trait::async_trait;

use crate::domain::commission::CommissionRecord;
use crate::domain::foundation::{DomainError, PartnerId, TrialId};

/// Commission records outlive the trials they reference, so this store is
/// independent of the trial repository.
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Stores a record.
    ///
    /// # Errors
    ///
    /// - `DuplicateRecord` if a record already exists for the trial
    /// - `StorageUnavailable` or `CorruptRecord` on persistence failure
    async fn insert(&self, record: &CommissionRecord) -> Result<(), DomainError>;

    async fn find_by_trial(&self, trial_id: &TrialId)
        -> Result<Option<CommissionRecord>, DomainError>;

    async fn list_by_partner(&self, partner_id: &PartnerId)
        -> Result<Vec<CommissionRecord>, DomainError>;
}
