//! Application handlers.
//!
//! One command or query per module. Every mutation loads the account under
//! its lock, applies the domain operation, persists, then publishes.

mod extend_trial;
mod get_trial;
mod list_follow_ups;
mod onboard_trial;
mod override_package;
mod reassess_risk;
mod record_activity;
mod record_conversion;
mod run_tick;

#[cfg(test)]
pub(crate) mod test_support;

pub use extend_trial::{ExtendTrialCommand, ExtendTrialHandler};
pub use get_trial::{GetTrialHandler, GetTrialQuery};
pub use list_follow_ups::{FollowUpItem, ListFollowUpsHandler, ListFollowUpsQuery};
pub use onboard_trial::{OnboardTrialCommand, OnboardTrialHandler, OnboardTrialResult};
pub use override_package::{OverridePackageCommand, OverridePackageHandler};
pub use reassess_risk::{ReassessRiskCommand, ReassessRiskHandler, ReassessRiskResult};
pub use record_activity::{RecordActivityCommand, RecordActivityHandler};
pub use record_conversion::{
    RecordConversionCommand, RecordConversionHandler, RecordConversionResult,
};
pub use run_tick::{RunTickCommand, RunTickHandler, TickResult};

use crate::domain::foundation::TrialId;
use crate::domain::trial::{TrialAccount, TrialError};
use crate::ports::TrialRepository;

/// Loads an account or fails with `NotFound`.
pub(crate) async fn load_account(
    repository: &dyn TrialRepository,
    id: TrialId,
) -> Result<TrialAccount, TrialError> {
    repository
        .find_by_id(&id)
        .await?
        .ok_or(TrialError::NotFound(id))
}
