//! Notifier port - Delivers one milestone attempt to the outside world.
//!
//! Delivery may block on network I/O. Callers never hold an account lock
//! while awaiting `send` and bound each call with a timeout.

use async_trait::async_trait;

use crate::domain::notification::{DeliveryError, DeliveryRequest};

/// Port for sending milestone notifications.
///
/// Delivery is at-least-once: the same `dedup_key` may arrive more than
/// once after a restart, and implementations should treat a repeat as a
/// no-op success.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one attempt.
    ///
    /// # Errors
    ///
    /// - `Unavailable` for transient transport failures
    /// - `Rejected` when the request can never succeed
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}
