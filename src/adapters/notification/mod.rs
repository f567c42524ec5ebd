//! Notifier adapters.
//!
//! - `TracingNotifier` - log-only delivery
//! - `WebhookNotifier` - signed JSON POST
//! - `IdempotentNotifier` - receipt-backed dedup decorator

mod idempotent;
mod tracing_notifier;
mod webhook;

pub use idempotent::IdempotentNotifier;
pub use tracing_notifier::TracingNotifier;
pub use webhook::{
    sign, verify_signature, WebhookConfig, WebhookNotifier, IDEMPOTENCY_HEADER, SIGNATURE_HEADER,
};
