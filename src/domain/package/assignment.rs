//! PackageAssignment - recommended tier plus the override audit trail.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

use super::PackageTier;

const MAX_REASON_LEN: usize = 500;

/// One administrative override, kept forever for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOverride {
    pub tier: PackageTier,
    pub reason: String,
    pub overridden_at: Timestamp,
}

/// The tier an account is on.
///
/// The latest override always wins over the recommendation. Refreshing the
/// recommendation never clears or alters an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAssignment {
    recommended: PackageTier,
    #[serde(default)]
    overrides: Vec<PackageOverride>,
}

impl PackageAssignment {
    pub fn recommended(tier: PackageTier) -> Self {
        Self {
            recommended: tier,
            overrides: Vec::new(),
        }
    }

    /// The tier in force.
    pub fn effective(&self) -> PackageTier {
        self.overrides
            .last()
            .map(|o| o.tier)
            .unwrap_or(self.recommended)
    }

    pub fn recommendation(&self) -> PackageTier {
        self.recommended
    }

    pub fn is_overridden(&self) -> bool {
        !self.overrides.is_empty()
    }

    pub fn overrides(&self) -> &[PackageOverride] {
        &self.overrides
    }

    /// Records an override.
    ///
    /// # Errors
    ///
    /// - `EmptyField` when `reason` is blank
    /// - `OutOfRange` when `reason` exceeds 500 characters
    pub fn apply_override(
        &mut self,
        tier: PackageTier,
        reason: &str,
        at: Timestamp,
    ) -> Result<(), ValidationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::empty_field("reason"));
        }
        let len = reason.chars().count();
        if len > MAX_REASON_LEN {
            return Err(ValidationError::out_of_range(
                "reason",
                1,
                MAX_REASON_LEN as i32,
                len as i32,
            ));
        }
        self.overrides.push(PackageOverride {
            tier,
            reason: reason.to_string(),
            overridden_at: at,
        });
        Ok(())
    }

    /// Replaces the computed recommendation. Returns true when it changed.
    pub fn refresh_recommendation(&mut self, tier: PackageTier) -> bool {
        let changed = self.recommended != tier;
        self.recommended = tier;
        changed
    }
}
