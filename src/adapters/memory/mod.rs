//! In-memory adapters for tests and single-process deployments.

mod commission_repository;
mod delivery_receipt_store;
mod trial_repository;

pub use commission_repository::InMemoryCommissionRepository;
pub use delivery_receipt_store::InMemoryDeliveryReceiptStore;
pub use trial_repository::InMemoryTrialRepository;
