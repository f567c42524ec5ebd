//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, errors and event plumbing
//! that form the vocabulary of the trial engine.

mod errors;
mod events;
mod ids;
mod money;
mod percentage;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata};
pub use ids::{CommissionId, MilestoneId, PartnerId, TrialId};
pub use money::{Money, Rate};
pub use percentage::Percentage;
pub use state_machine::{StateMachine, TransitionRejected};
pub use timestamp::Timestamp;
