//! Commission domain module.
//!
//! Pure commission arithmetic plus the immutable record created when a
//! partner-attributed trial converts.

mod calculator;
mod record;

pub use calculator::{CommissionCalculator, CommissionRates, PartnerTier};
pub use record::{CommissionRecord, PartnerAttribution};
