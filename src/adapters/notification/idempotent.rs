//! IdempotentNotifier - skips attempts whose dedup key was already delivered.
//!
//! 1. Before sending: check the receipt store for the dedup key
//! 2. If present: return Ok without calling the inner notifier
//! 3. Otherwise delegate, and record a receipt after a successful send
//!
//! A failed send leaves no receipt, so the attempt can be retried.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::notification::{DeliveryError, DeliveryRequest};
use crate::ports::{Clock, DeliveryReceiptStore, Notifier};

pub struct IdempotentNotifier<N: Notifier> {
    inner: N,
    receipts: Arc<dyn DeliveryReceiptStore>,
    clock: Arc<dyn Clock>,
}

impl<N: Notifier> IdempotentNotifier<N> {
    pub fn new(inner: N, receipts: Arc<dyn DeliveryReceiptStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            receipts,
            clock,
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: Notifier + 'static> Notifier for IdempotentNotifier<N> {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        let seen = self
            .receipts
            .contains(&request.dedup_key)
            .await
            .map_err(|e| DeliveryError::Unavailable(format!("receipt store: {}", e)))?;
        if seen {
            tracing::debug!(
                dedup_key = %request.dedup_key,
                notifier = self.inner.name(),
                "skipping already delivered attempt"
            );
            return Ok(());
        }

        self.inner.send(request).await?;

        let delivered_at: Timestamp = self.clock.now();
        if let Err(e) = self.receipts.record(&request.dedup_key, delivered_at).await {
            // The send went through; a missing receipt only risks a duplicate later.
            tracing::warn!(dedup_key = %request.dedup_key, error = %e, "failed to record delivery receipt");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
