//! Activity records appended to a trial account.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

const MAX_DETAIL_LEN: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    FeatureUsed,
    ScanCompleted,
    SupportRequest,
    MeetingHeld,
    Other,
}

/// Something the prospect did during the trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub occurred_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActivityRecord {
    pub fn new(kind: ActivityKind, occurred_at: Timestamp) -> Self {
        Self {
            kind,
            occurred_at,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// # Errors
    ///
    /// - `InvalidFormat` on `occurred_at` when it lies after `now`
    /// - `OutOfRange` on `detail` when longer than 1000 characters
    pub fn validate(&self, now: Timestamp) -> Result<(), ValidationError> {
        if self.occurred_at > now {
            return Err(ValidationError::invalid_format(
                "occurred_at",
                format!("{} is in the future", self.occurred_at),
            ));
        }
        if let Some(detail) = &self.detail {
            let len = detail.chars().count();
            if len > MAX_DETAIL_LEN {
                return Err(ValidationError::out_of_range(
                    "detail",
                    0,
                    MAX_DETAIL_LEN as i32,
                    len as i32,
                ));
            }
        }
        Ok(())
    }
}
