//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! `Orchestrator` is the public facade; `Ticker` drives it on an interval.

pub mod handlers;
mod locks;
mod orchestrator;
mod publishing;
mod scheduler;
mod ticker;

pub use handlers::{
    ExtendTrialCommand, ExtendTrialHandler, FollowUpItem, GetTrialHandler, GetTrialQuery,
    ListFollowUpsHandler, ListFollowUpsQuery, OnboardTrialCommand, OnboardTrialHandler,
    OnboardTrialResult, OverridePackageCommand, OverridePackageHandler, ReassessRiskCommand,
    ReassessRiskHandler, ReassessRiskResult, RecordActivityCommand, RecordActivityHandler,
    RecordConversionCommand, RecordConversionHandler, RecordConversionResult, RunTickCommand,
    RunTickHandler, TickResult,
};
pub use locks::AccountLocks;
pub use orchestrator::{EngineSettings, Orchestrator, OrchestratorPorts};
pub use publishing::EventSink;
pub use scheduler::NotificationScheduler;
pub use ticker::Ticker;
