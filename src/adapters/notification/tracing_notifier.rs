//! Notifier that only writes a structured log line.
//!
//! Used when no outbound endpoint is configured, so milestones still move
//! through their lifecycle and show up in the logs.

use async_trait::async_trait;

use crate::domain::notification::{DeliveryError, DeliveryRequest};
use crate::ports::Notifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        tracing::info!(
            trial_id = %request.trial_id,
            milestone_id = %request.milestone_id,
            kind = %request.kind,
            attempt = request.attempt,
            company = %request.company_name,
            package = %request.package_tier,
            "milestone notification"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}
