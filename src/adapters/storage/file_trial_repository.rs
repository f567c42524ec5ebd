//! File-based TrialRepository.
//!
//! Stores each account as `<trial_id>.yaml` under the base directory.
//! Writes go to a temporary file first and are renamed into place, so a
//! crash never leaves a half-written account behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

use crate::domain::foundation::{DomainError, ErrorCode, TrialId};
use crate::domain::trial::{TrialAccount, TrialStatus};
use crate::ports::TrialRepository;

const EXTENSION: &str = "yaml";

#[derive(Debug, Clone)]
pub struct FileTrialRepository {
    base_path: PathBuf,
}

impl FileTrialRepository {
    /// ```ignore
    /// let repo = FileTrialRepository::new("./data/trials");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn account_path(&self, id: &TrialId) -> PathBuf {
        self.base_path.join(format!("{}.{}", id, EXTENSION))
    }

    async fn ensure_dir(&self) -> Result<(), DomainError> {
        fs::create_dir_all(&self.base_path).await.map_err(io_error)
    }

    async fn write(&self, account: &TrialAccount) -> Result<(), DomainError> {
        self.ensure_dir().await?;
        let yaml = serde_yaml::to_string(account).map_err(|e| {
            DomainError::new(ErrorCode::CorruptRecord, e.to_string())
                .with_detail("trial_id", account.id.to_string())
        })?;

        let path = self.account_path(&account.id);
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)
    }

    async fn read(&self, path: &Path) -> Result<TrialAccount, DomainError> {
        let yaml = fs::read_to_string(path).await.map_err(io_error)?;
        serde_yaml::from_str(&yaml).map_err(|e| {
            DomainError::new(ErrorCode::CorruptRecord, e.to_string())
                .with_detail("path", path.display().to_string())
        })
    }

    async fn load_all(&self) -> Result<Vec<TrialAccount>, DomainError> {
        let mut accounts = Vec::new();
        for id in self.list_ids().await? {
            accounts.push(self.read(&self.account_path(&id)).await?);
        }
        Ok(accounts)
    }
}

fn io_error(e: std::io::Error) -> DomainError {
    DomainError::new(ErrorCode::StorageUnavailable, e.to_string())
}

#[async_trait]
impl TrialRepository for FileTrialRepository {
    async fn insert(&self, account: &TrialAccount) -> Result<(), DomainError> {
        if fs::try_exists(self.account_path(&account.id))
            .await
            .map_err(io_error)?
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateRecord,
                format!("Trial {} already exists", account.id),
            ));
        }
        self.write(account).await
    }

    async fn update(&self, account: &TrialAccount) -> Result<(), DomainError> {
        if !fs::try_exists(self.account_path(&account.id))
            .await
            .map_err(io_error)?
        {
            return Err(DomainError::new(
                ErrorCode::TrialNotFound,
                format!("Trial {} not found", account.id),
            ));
        }
        self.write(account).await
    }

    async fn find_by_id(&self, id: &TrialId) -> Result<Option<TrialAccount>, DomainError> {
        let path = self.account_path(id);
        if !fs::try_exists(&path).await.map_err(io_error)? {
            return Ok(None);
        }
        self.read(&path).await.map(Some)
    }

    async fn list_ids(&self) -> Result<Vec<TrialId>, DomainError> {
        if !fs::try_exists(&self.base_path).await.map_err(io_error)? {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match TrialId::from_str(stem) {
                Ok(id) => ids.push(id),
                Err(_) => tracing::warn!(path = %path.display(), "ignoring unrecognized file"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn list_by_status(&self, status: TrialStatus) -> Result<Vec<TrialAccount>, DomainError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|a| a.status == status)
            .collect())
    }

    async fn find_needing_follow_up(&self) -> Result<Vec<TrialAccount>, DomainError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|a| a.milestones_needing_follow_up().next().is_some())
            .collect())
    }
}
