//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, events)
//! - `profile` - Company intake profile
//! - `risk` - Weighted risk/value scoring
//! - `package` - Commercial tiers and recommendation
//! - `commission` - Partner commission arithmetic and records
//! - `trial` - TrialAccount aggregate and lifecycle state machine
//! - `notification` - Delivery retry policy and request vocabulary

pub mod commission;
pub mod foundation;
pub mod notification;
pub mod package;
pub mod profile;
pub mod risk;
pub mod trial;
