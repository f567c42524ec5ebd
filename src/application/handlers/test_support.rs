//! Shared fixtures for handler tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};

use crate::adapters::{InMemoryEventBus, InMemoryTrialRepository, ManualClock};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, TrialId};
use crate::domain::notification::{DeliveryError, DeliveryRequest};
use crate::domain::package::{PackageAssignment, PackageTier};
use crate::domain::profile::{CompanyProfile, EmployeeCountBucket, Industry, SourceChannel};
use crate::domain::risk::RiskAssessmentEngine;
use crate::domain::trial::{TrialAccount, TrialLifecycleManager, TrialStatus};
use crate::ports::{Notifier, TrialRepository};

pub(crate) fn t0() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

pub(crate) fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

pub(crate) fn profile(name: &str) -> CompanyProfile {
    CompanyProfile::builder()
        .name(name)
        .industry(Industry::Healthcare)
        .employee_count(EmployeeCountBucket::MidMarket)
        .source_channel(SourceChannel::Partner)
        .build()
        .unwrap()
}

/// An activated account with the default 30-day window starting at `t0`.
pub(crate) fn active_account(name: &str) -> TrialAccount {
    let profile = profile(name);
    let risk = RiskAssessmentEngine::default().assess(&profile, t0()).unwrap();
    let mut account = TrialAccount::new_pending(
        profile,
        risk,
        PackageAssignment::recommended(PackageTier::Plus),
        chrono::Duration::days(30),
        t0(),
    );
    TrialLifecycleManager::default()
        .activate(&mut account, t0())
        .unwrap();
    account
}

pub(crate) async fn seeded(account: &TrialAccount) -> Arc<InMemoryTrialRepository> {
    let repo = Arc::new(InMemoryTrialRepository::new());
    repo.insert(account).await.unwrap();
    repo
}

pub(crate) fn bus() -> Arc<InMemoryEventBus> {
    Arc::new(InMemoryEventBus::new())
}

/// Records every request and succeeds.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<DeliveryRequest>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Repository whose reads and writes always fail.
pub(crate) struct BrokenRepository;

#[async_trait]
impl TrialRepository for BrokenRepository {
    async fn insert(&self, _: &TrialAccount) -> Result<(), DomainError> {
        Err(broken())
    }

    async fn update(&self, _: &TrialAccount) -> Result<(), DomainError> {
        Err(broken())
    }

    async fn find_by_id(&self, _: &TrialId) -> Result<Option<TrialAccount>, DomainError> {
        Err(broken())
    }

    async fn list_ids(&self) -> Result<Vec<TrialId>, DomainError> {
        Err(broken())
    }

    async fn list_by_status(&self, _: TrialStatus) -> Result<Vec<TrialAccount>, DomainError> {
        Err(broken())
    }

    async fn find_needing_follow_up(&self) -> Result<Vec<TrialAccount>, DomainError> {
        Err(broken())
    }
}

fn broken() -> DomainError {
    DomainError::new(ErrorCode::StorageUnavailable, "disk on fire")
}
