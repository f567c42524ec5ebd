//! TrialRepository port - Persistence of TrialAccount aggregates.
//!
//! Each account is stored and loaded as one flat record including its
//! milestone and activity lists. Whether that is a document or a set of
//! tables is up to the adapter.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TrialId};
use crate::domain::trial::{TrialAccount, TrialStatus};

/// Repository port for trial accounts.
///
/// Callers serialize access per account; implementations only need to make
/// each call atomic on its own.
#[async_trait]
pub trait TrialRepository: Send + Sync {
    /// Stores a new account.
    ///
    /// # Errors
    ///
    /// - `DuplicateRecord` if the id already exists
    /// - `StorageUnavailable` or `CorruptRecord` on persistence failure
    async fn insert(&self, account: &TrialAccount) -> Result<(), DomainError>;

    /// Replaces an existing account.
    ///
    /// # Errors
    ///
    /// - `TrialNotFound` if the account doesn't exist
    /// - `StorageUnavailable` or `CorruptRecord` on persistence failure
    async fn update(&self, account: &TrialAccount) -> Result<(), DomainError>;

    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &TrialId) -> Result<Option<TrialAccount>, DomainError>;

    /// All account ids, in ascending order.
    async fn list_ids(&self) -> Result<Vec<TrialId>, DomainError>;

    /// Accounts currently in `status`.
    async fn list_by_status(&self, status: TrialStatus) -> Result<Vec<TrialAccount>, DomainError>;

    /// Accounts with at least one milestone flagged for manual follow-up.
    async fn find_needing_follow_up(&self) -> Result<Vec<TrialAccount>, DomainError>;
}
