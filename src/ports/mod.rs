//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Time
//!
//! - `Clock` - Injected time source
//!
//! ## Persistence Ports
//!
//! - `TrialRepository` - TrialAccount aggregates
//! - `CommissionRepository` - Append-only commission records
//! - `DeliveryReceiptStore` - Delivered dedup keys
//!
//! ## Outbound Ports
//!
//! - `Notifier` - Milestone delivery
//! - `EventPublisher` - Lifecycle event publication

mod clock;
mod commission_repository;
mod delivery_receipt_store;
mod event_publisher;
mod notifier;
mod trial_repository;

pub use clock::Clock;
pub use commission_repository::CommissionRepository;
pub use delivery_receipt_store::DeliveryReceiptStore;
pub use event_publisher::EventPublisher;
pub use notifier::Notifier;
pub use trial_repository::TrialRepository;
