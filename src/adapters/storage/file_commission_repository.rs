//! File-based CommissionRepository.
//!
//! One `<trial_id>.yaml` per commission. Records are never rewritten.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::commission::CommissionRecord;
use crate::domain::foundation::{DomainError, ErrorCode, PartnerId, TrialId};
use crate::ports::CommissionRepository;

#[derive(Debug, Clone)]
pub struct FileCommissionRepository {
    base_path: PathBuf,
}

impl FileCommissionRepository {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, trial_id: &TrialId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", trial_id))
    }

    async fn read(&self, path: &Path) -> Result<CommissionRecord, DomainError> {
        let yaml = fs::read_to_string(path).await.map_err(io_error)?;
        serde_yaml::from_str(&yaml)
            .map_err(|e| DomainError::new(ErrorCode::CorruptRecord, e.to_string()))
    }
}

fn io_error(e: std::io::Error) -> DomainError {
    DomainError::new(ErrorCode::StorageUnavailable, e.to_string())
}

#[async_trait]
impl CommissionRepository for FileCommissionRepository {
    async fn insert(&self, record: &CommissionRecord) -> Result<(), DomainError> {
        fs::create_dir_all(&self.base_path).await.map_err(io_error)?;
        let path = self.record_path(record.trial_id());
        if fs::try_exists(&path).await.map_err(io_error)? {
            return Err(DomainError::new(
                ErrorCode::DuplicateRecord,
                format!("Commission for trial {} already recorded", record.trial_id()),
            ));
        }
        let yaml = serde_yaml::to_string(record)
            .map_err(|e| DomainError::new(ErrorCode::CorruptRecord, e.to_string()))?;
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)
    }

    async fn find_by_trial(
        &self,
        trial_id: &TrialId,
    ) -> Result<Option<CommissionRecord>, DomainError> {
        let path = self.record_path(trial_id);
        if !fs::try_exists(&path).await.map_err(io_error)? {
            return Ok(None);
        }
        self.read(&path).await.map(Some)
    }

    async fn list_by_partner(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<CommissionRecord>, DomainError> {
        if !fs::try_exists(&self.base_path).await.map_err(io_error)? {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let record = self.read(&path).await?;
            if record.partner_id() == partner_id {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.created_at());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::{CommissionCalculator, PartnerAttribution, PartnerTier};
    use crate::domain::foundation::{Money, Timestamp};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(partner: &str) -> CommissionRecord {
        let attribution = PartnerAttribution::new(
            PartnerId::new(partner).unwrap(),
            PartnerTier::Gold,
            Money::from_dollars(50_000),
        )
        .unwrap();
        CommissionRecord::create(
            &CommissionCalculator::default(),
            TrialId::new(),
            &attribution,
            Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
        )
    }

    #[tokio::test]
    async fn stores_and_finds_by_trial() {
        let dir = TempDir::new().unwrap();
        let repo = FileCommissionRepository::new(dir.path());
        let r = record("acme-partners");

        repo.insert(&r).await.unwrap();

        let found = repo.find_by_trial(r.trial_id()).await.unwrap().unwrap();
        assert_eq!(found, r);
        assert_eq!(found.amount(), Money::from_dollars(15_000));
    }

    #[tokio::test]
    async fn second_commission_for_trial_is_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = FileCommissionRepository::new(dir.path());
        let r = record("acme-partners");
        repo.insert(&r).await.unwrap();

        let err = repo.insert(&r).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRecord);
    }

    #[tokio::test]
    async fn lists_only_the_partners_records() {
        let dir = TempDir::new().unwrap();
        let repo = FileCommissionRepository::new(dir.path());
        repo.insert(&record("a")).await.unwrap();
        repo.insert(&record("a")).await.unwrap();
        repo.insert(&record("b")).await.unwrap();

        let a = PartnerId::new("a").unwrap();
        assert_eq!(repo.list_by_partner(&a).await.unwrap().len(), 2);
    }
}
