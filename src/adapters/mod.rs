//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `clock` - System and manual clocks
//! - `events` - Lifecycle event sinks
//! - `memory` - In-memory repositories and receipt store
//! - `storage` - YAML-on-disk repositories
//! - `notification` - Milestone notifiers

pub mod clock;
pub mod events;
pub mod memory;
pub mod notification;
pub mod storage;

pub use clock::{ManualClock, SystemClock};
pub use events::InMemoryEventBus;
pub use memory::{InMemoryCommissionRepository, InMemoryDeliveryReceiptStore, InMemoryTrialRepository};
pub use notification::{IdempotentNotifier, TracingNotifier, WebhookConfig, WebhookNotifier};
pub use storage::{FileCommissionRepository, FileTrialRepository};
