//! Webhook notifier.
//!
//! POSTs each delivery request as JSON. The body is signed with
//! HMAC-SHA256 and the hex digest sent in `X-Trialflow-Signature`, so the
//! receiver can authenticate it. `Idempotency-Key` carries the dedup key.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::notification::{DeliveryError, DeliveryRequest};
use crate::ports::Notifier;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Trialflow-Signature";
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Configuration for the webhook notifier.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    signing_secret: Secret<String>,
    /// Transport timeout. The scheduler applies its own send timeout on top.
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            signing_secret: Secret::new(signing_secret.into()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// `ConfigurationInvalid` if the URL is blank or the HTTP client cannot
    /// be built.
    pub fn new(config: WebhookConfig) -> Result<Self, DomainError> {
        if config.url.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ConfigurationInvalid,
                "Webhook URL must not be empty",
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::ConfigurationInvalid,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { config, client })
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex signature in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(provided) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();
    expected.as_slice().ct_eq(&provided).unwrap_u8() == 1
}

/// Maps a non-success status to a delivery outcome.
///
/// 409 means the receiver already holds this dedup key.
fn classify_status(status: StatusCode, body: String) -> Result<(), DeliveryError> {
    if status.is_success() || status == StatusCode::CONFLICT {
        return Ok(());
    }
    match status.as_u16() {
        408 | 429 | 500..=599 => Err(DeliveryError::Unavailable(format!(
            "status {}: {}",
            status, body
        ))),
        _ => Err(DeliveryError::Rejected(format!("status {}: {}", status, body))),
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| DeliveryError::Rejected(format!("unserializable request: {}", e)))?;
        let signature = sign(self.config.signing_secret.expose_secret(), &body)
            .ok_or_else(|| DeliveryError::Rejected("invalid signing key".to_string()))?;

        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(IDEMPOTENCY_HEADER, &request.dedup_key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout(self.timeout_ms())
                } else if e.is_connect() {
                    DeliveryError::Unavailable(format!("Connection failed: {}", e))
                } else {
                    DeliveryError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            tracing::debug!(dedup_key = %request.dedup_key, "webhook receiver already has this delivery");
        }
        classify_status(status, body)
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
