//! Notification delivery configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::notification::RetryPolicy;

use super::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Attempts per milestone, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_backoff_secs")]
    pub base_backoff_secs: i64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: i64,

    /// Upper bound on a single send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Webhook endpoint. Without one, deliveries are written to the log.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// HMAC key for the webhook signature header
    #[serde(default)]
    pub webhook_secret: Option<Secret<String>>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_secs: default_base_backoff_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_secs: default_max_backoff_secs(),
            send_timeout_ms: default_send_timeout_ms(),
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

impl DeliveryConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy, ValidationError> {
        RetryPolicy::new(
            self.max_attempts,
            chrono::Duration::seconds(self.base_backoff_secs),
            self.backoff_multiplier,
            chrono::Duration::seconds(self.max_backoff_secs),
        )
        .map_err(ValidationError::section("delivery"))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn webhook_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.retry_policy()?;

        if self.send_timeout_ms == 0 {
            return Err(ValidationError::InvalidSendTimeout);
        }

        if let Some(url) = &self.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidWebhookUrl);
            }
            if self.webhook_secret.is_none() {
                return Err(ValidationError::MissingRequired(
                    "TRIALFLOW__DELIVERY__WEBHOOK_SECRET",
                ));
            }
        }

        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_secs() -> i64 {
    60
}

fn default_backoff_multiplier() -> u32 {
    2
}

fn default_max_backoff_secs() -> i64 {
    3_600
}

fn default_send_timeout_ms() -> u64 {
    10_000
}
