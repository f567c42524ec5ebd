//! Clock port - Injected source of the current instant.
//!
//! Time-dependent logic never reads a global clock. Production wires the
//! system clock; tests drive a manual one and advance it without sleeping.

use crate::domain::foundation::Timestamp;

/// Port for reading the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}
