//! Validation and port errors shared by every trial component.
//!
//! `ValidationError` describes bad caller input and is never retried.
//! `DomainError` is what repositories, notifiers' configuration and event
//! publishers return; handlers fold it into `TrialError`.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Rejected input, naming the field at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' is required")]
    MissingField { field: String },

    /// Weights, thresholds and counts checked against a closed range.
    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        ValidationError::MissingField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: i32, max: i32, actual: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::MissingField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Machine-readable cause of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Caller input
    ValidationFailed,
    ConfigurationInvalid,

    // Account state
    TrialNotFound,
    InvalidStateTransition,

    // Record store
    DuplicateRecord,
    CorruptRecord,
    StorageUnavailable,

    // Event publication
    PublishFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ConfigurationInvalid => "CONFIGURATION_INVALID",
            ErrorCode::TrialNotFound => "TRIAL_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DuplicateRecord => "DUPLICATE_RECORD",
            ErrorCode::CorruptRecord => "CORRUPT_RECORD",
            ErrorCode::StorageUnavailable => "STORAGE_UNAVAILABLE",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port failure with its code and the record it concerns.
///
/// Details render in key order after the message, so a logged error names
/// the trial or file it came from.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for (key, value) in &self.details {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_company_name_is_reported_by_field() {
        let err = ValidationError::empty_field("name");
        assert_eq!(err.to_string(), "Field 'name' cannot be empty");
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn weight_out_of_range_shows_bounds() {
        let err = ValidationError::out_of_range("weights.company_tier", 0, 100, 150);
        assert_eq!(
            err.to_string(),
            "Field 'weights.company_tier' must be between 0 and 100, got 150"
        );
    }

    #[test]
    fn domain_error_without_details_shows_code_and_message() {
        let err = DomainError::new(ErrorCode::TrialNotFound, "no such trial");
        assert_eq!(err.to_string(), "[TRIAL_NOT_FOUND] no such trial");
    }

    #[test]
    fn details_render_in_key_order() {
        let err = DomainError::new(ErrorCode::CorruptRecord, "bad yaml")
            .with_detail("trial_id", "t-1")
            .with_detail("path", "/data/trials/t-1.yaml");
        assert_eq!(
            err.to_string(),
            "[CORRUPT_RECORD] bad yaml path=/data/trials/t-1.yaml trial_id=t-1"
        );
    }
}
