//! Configuration error types

use thiserror::Error;

use crate::domain::foundation::ValidationError as DomainValidationError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Worker pool size must be between 1 and 256")]
    InvalidWorkerPoolSize,

    #[error("Tick interval must be at least one second")]
    InvalidTickInterval,

    #[error("Send timeout must be positive")]
    InvalidSendTimeout,

    #[error("Webhook URL must use http or https")]
    InvalidWebhookUrl,

    #[error("Invalid {section} configuration: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: DomainValidationError,
    },
}

impl ValidationError {
    pub(crate) fn section(section: &'static str) -> impl FnOnce(DomainValidationError) -> Self {
        move |source| ValidationError::InvalidSection { section, source }
    }
}
