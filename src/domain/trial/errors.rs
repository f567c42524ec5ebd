//! Caller-facing error of every trial operation.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, TrialId, ValidationError};

use super::TrialStatus;

#[derive(Debug, Clone, Error)]
pub enum TrialError {
    /// Bad input. Never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Trial not found: {0}")]
    NotFound(TrialId),

    /// Operation not allowed in the account's current state. Not retried.
    #[error("Cannot {attempted} a trial in {current} state")]
    StateConflict {
        current: TrialStatus,
        attempted: &'static str,
    },

    /// Missing or invalid policy configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Repository or publisher failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TrialError {
    pub fn state_conflict(current: TrialStatus, attempted: &'static str) -> Self {
        TrialError::StateConflict { current, attempted }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        TrialError::Storage(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TrialError::Validation(_) => ErrorCode::ValidationFailed,
            TrialError::NotFound(_) => ErrorCode::TrialNotFound,
            TrialError::StateConflict { .. } => ErrorCode::InvalidStateTransition,
            TrialError::Configuration(_) => ErrorCode::ConfigurationInvalid,
            TrialError::Storage(_) => ErrorCode::StorageUnavailable,
        }
    }

    /// True only for infrastructure faults.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrialError::Storage(_))
    }
}

impl From<DomainError> for TrialError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => {
                TrialError::Validation(ValidationError::invalid_format("record", err.message))
            }
            ErrorCode::ConfigurationInvalid => TrialError::Configuration(err.message),
            _ => TrialError::Storage(err.to_string()),
        }
    }
}
