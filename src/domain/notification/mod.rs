//! Notification domain module.
//!
//! Retry policy and the request/error vocabulary between the scheduler and
//! any notifier. Deciding when to attempt lives on the milestone itself and
//! in the application scheduler; sending lives behind the `Notifier` port.

mod delivery;
mod policy;

pub use delivery::{DeliveryError, DeliveryRequest};
pub use policy::RetryPolicy;
