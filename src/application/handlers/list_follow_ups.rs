//! ListFollowUpsHandler - milestones whose delivery was exhausted.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::foundation::{MilestoneId, Timestamp, TrialId};
use crate::domain::trial::{MilestoneKind, TrialError};
use crate::ports::TrialRepository;

#[derive(Debug, Clone, Copy, Default)]
pub struct ListFollowUpsQuery;

/// One milestone needing manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpItem {
    pub trial_id: TrialId,
    pub company_name: String,
    pub milestone_id: MilestoneId,
    pub kind: MilestoneKind,
    pub due_at: Timestamp,
    pub attempts: u32,
    pub last_error: Option<String>,
}

pub struct ListFollowUpsHandler {
    repository: Arc<dyn TrialRepository>,
}

impl ListFollowUpsHandler {
    pub fn new(repository: Arc<dyn TrialRepository>) -> Self {
        Self { repository }
    }

    /// Items ordered by due time, oldest first.
    pub async fn handle(&self, _query: ListFollowUpsQuery) -> Result<Vec<FollowUpItem>, TrialError> {
        let accounts = self.repository.find_needing_follow_up().await?;

        let mut items: Vec<FollowUpItem> = accounts
            .iter()
            .flat_map(|account| {
                account
                    .milestones_needing_follow_up()
                    .map(move |m| FollowUpItem {
                        trial_id: account.id,
                        company_name: account.profile.name.clone(),
                        milestone_id: m.id,
                        kind: m.kind,
                        due_at: m.due_at,
                        attempts: m.attempt_count,
                        last_error: m.last_error.clone(),
                    })
            })
            .collect();
        items.sort_by_key(|i| (i.due_at, i.trial_id));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryTrialRepository;
    use crate::application::handlers::test_support::active_account;
    use crate::domain::trial::MilestoneStatus;

    #[tokio::test]
    async fn lists_flagged_milestones_only() {
        let repo = Arc::new(InMemoryTrialRepository::new());
        let mut failed = active_account("Acme Failed");
        failed.milestones[0].status = MilestoneStatus::Failed;
        failed.milestones[0].needs_follow_up = true;
        failed.milestones[0].attempt_count = 3;
        failed.milestones[0].last_error = Some("notifier unavailable: down".into());
        repo.insert(&failed).await.unwrap();
        repo.insert(&active_account("Acme Fine")).await.unwrap();

        let items = ListFollowUpsHandler::new(repo)
            .handle(ListFollowUpsQuery)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].trial_id, failed.id);
        assert_eq!(items[0].kind, MilestoneKind::WelcomeSent);
        assert_eq!(items[0].attempts, 3);
    }
}
