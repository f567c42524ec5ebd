//! DeliveryReceiptStore port - Tracks dedup keys already delivered.
//!
//! Lets a notifier decorator skip attempts that reached the downstream
//! system before a crash prevented the outcome from being recorded.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

#[async_trait]
pub trait DeliveryReceiptStore: Send + Sync {
    /// True if `dedup_key` was already delivered.
    async fn contains(&self, dedup_key: &str) -> Result<bool, DomainError>;

    /// Records a successful delivery. Call only after the send succeeded.
    async fn record(&self, dedup_key: &str, delivered_at: Timestamp) -> Result<(), DomainError>;
}
