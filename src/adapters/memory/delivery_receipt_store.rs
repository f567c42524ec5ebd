//! In-memory DeliveryReceiptStore.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::DeliveryReceiptStore;

#[derive(Debug, Default)]
pub struct InMemoryDeliveryReceiptStore {
    receipts: RwLock<HashMap<String, Timestamp>>,
}

impl InMemoryDeliveryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryReceiptStore for InMemoryDeliveryReceiptStore {
    async fn contains(&self, dedup_key: &str) -> Result<bool, DomainError> {
        Ok(self.receipts.read().await.contains_key(dedup_key))
    }

    async fn record(&self, dedup_key: &str, delivered_at: Timestamp) -> Result<(), DomainError> {
        self.receipts
            .write()
            .await
            .entry(dedup_key.to_string())
            .or_insert(delivered_at);
        Ok(())
    }
}
