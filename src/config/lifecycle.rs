//! Trial lifecycle configuration
//!
//! Reminder offsets (D-7, D-3, D-1) are fixed by the milestone kinds and are
//! not configurable.

use chrono::Duration;
use serde::Deserialize;

use crate::domain::trial::LifecycleSettings;

use super::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_trial_length_days")]
    pub trial_length_days: i64,

    /// Final stretch of the trial in which reminders may fire
    #[serde(default = "default_expiring_window_days")]
    pub expiring_window_days: i64,

    /// Delay between activation and the consultant assignment notice
    #[serde(default = "default_consultant_assignment_hours")]
    pub consultant_assignment_hours: i64,

    /// Days a closed trial is kept before archival
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            trial_length_days: default_trial_length_days(),
            expiring_window_days: default_expiring_window_days(),
            consultant_assignment_hours: default_consultant_assignment_hours(),
            retention_days: default_retention_days(),
        }
    }
}

impl LifecycleConfig {
    pub fn settings(&self) -> Result<LifecycleSettings, ValidationError> {
        LifecycleSettings::new(
            Duration::days(self.trial_length_days),
            Duration::days(self.expiring_window_days),
            Duration::hours(self.consultant_assignment_hours),
            Duration::days(self.retention_days),
        )
        .map_err(ValidationError::section("lifecycle"))
    }
}

fn default_trial_length_days() -> i64 {
    30
}

fn default_expiring_window_days() -> i64 {
    7
}

fn default_consultant_assignment_hours() -> i64 {
    24
}

fn default_retention_days() -> i64 {
    90
}
