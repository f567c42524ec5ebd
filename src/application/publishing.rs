//! Lifecycle event publication.
//!
//! Events are wrapped in `EventEnvelope`s and handed to the configured
//! publisher. A publish failure is logged and never fails the operation
//! that produced the event.

use std::sync::Arc;

use crate::domain::foundation::EventEnvelope;
use crate::domain::trial::LifecycleEvent;
use crate::ports::EventPublisher;

#[derive(Clone, Default)]
pub struct EventSink {
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl EventSink {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            publisher: Some(publisher),
        }
    }

    pub fn disabled() -> Self {
        Self { publisher: None }
    }

    pub async fn publish(&self, events: &[LifecycleEvent]) {
        self.publish_inner(events, None).await;
    }

    /// Publishes with a shared correlation id, e.g. one per tick.
    pub async fn publish_correlated(&self, events: &[LifecycleEvent], correlation_id: &str) {
        self.publish_inner(events, Some(correlation_id)).await;
    }

    async fn publish_inner(&self, events: &[LifecycleEvent], correlation_id: Option<&str>) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        if events.is_empty() {
            return;
        }

        let mut envelopes = Vec::with_capacity(events.len());
        for event in events {
            match EventEnvelope::from_event(event) {
                Ok(envelope) => envelopes.push(match correlation_id {
                    Some(id) => envelope.with_correlation_id(id),
                    None => envelope,
                }),
                Err(e) => tracing::warn!(
                    trial_id = %event.trial_id(),
                    error = %e,
                    "failed to serialize lifecycle event"
                ),
            }
        }

        if let Err(e) = publisher.publish_all(envelopes).await {
            tracing::warn!(error = %e, count = events.len(), "failed to publish lifecycle events");
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("enabled", &self.publisher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryEventBus;
    use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, TrialId};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::PublishFailed, "broker down"))
        }
    }

    fn archived() -> LifecycleEvent {
        LifecycleEvent::Archived {
            trial_id: TrialId::new(),
            occurred_at: Timestamp::from_datetime(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn publishes_envelopes() {
        let bus = Arc::new(InMemoryEventBus::new());
        EventSink::new(bus.clone()).publish(&[archived(), archived()]).await;

        assert_eq!(bus.events_of_type("trial.archived.v1").len(), 2);
    }

    #[tokio::test]
    async fn correlated_envelopes_share_the_id() {
        let bus = Arc::new(InMemoryEventBus::new());
        EventSink::new(bus.clone())
            .publish_correlated(&[archived(), archived()], "tick-1")
            .await;

        let published = bus.published_events();
        assert_eq!(published.len(), 2);
        assert!(published
            .iter()
            .all(|e| e.metadata.correlation_id.as_deref() == Some("tick-1")));
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        EventSink::new(Arc::new(FailingPublisher))
            .publish(&[archived()])
            .await;
    }

    #[tokio::test]
    async fn disabled_sink_is_a_no_op() {
        EventSink::disabled().publish(&[archived()]).await;
    }
}
