//! Trial domain module.
//!
//! The `TrialAccount` aggregate, its status machine, milestones and
//! activities, the lifecycle events it emits, and the lifecycle manager that
//! decides transitions.

mod activity;
mod aggregate;
mod errors;
mod events;
mod lifecycle;
mod milestone;
mod status;

pub use activity::{ActivityKind, ActivityRecord};
pub use aggregate::{ConversionInfo, TrialAccount};
pub use errors::TrialError;
pub use events::{CancellationReason, LifecycleEvent};
pub use lifecycle::{LifecycleSettings, TrialLifecycleManager};
pub use milestone::{
    AttemptResolution, InFlightAttempt, MilestoneKind, MilestoneStatus, ScheduledMilestone,
};
pub use status::{TrialPhase, TrialStatus};
