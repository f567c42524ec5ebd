//! Trial status state machine and the derived lifecycle phase.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Persisted lifecycle state of a trial account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    /// Profile captured and package assigned; trial not started.
    Pending,

    /// Trial window running.
    Active,

    /// Marked paid. Terminal apart from archival.
    Converted,

    /// Trial window ended without conversion.
    Expired,

    /// Retention window elapsed. Terminal.
    Archived,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::Pending => "pending",
            TrialStatus::Active => "active",
            TrialStatus::Converted => "converted",
            TrialStatus::Expired => "expired",
            TrialStatus::Archived => "archived",
        }
    }

    /// True for states that start the retention clock.
    pub fn is_closed(&self) -> bool {
        matches!(self, TrialStatus::Converted | TrialStatus::Expired)
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for TrialStatus {
    const STATES: &'static [Self] = &[
        TrialStatus::Pending,
        TrialStatus::Active,
        TrialStatus::Converted,
        TrialStatus::Expired,
        TrialStatus::Archived,
    ];

    fn can_transition_to(&self, target: &Self) -> bool {
        use TrialStatus::*;
        matches!(
            (self, target),
            (Pending, Active)
                | (Pending, Converted)
                | (Active, Active) // Extension
                | (Active, Converted)
                | (Active, Expired)
                | (Expired, Archived)
                | (Converted, Archived)
        )
    }
}

/// Status refined by the clock.
///
/// `Expiring` is never stored; it is an `Active` account inside the final
/// window before its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    Pending,
    Active,
    Expiring,
    Converted,
    Expired,
    Archived,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_activates_or_converts() {
        assert!(TrialStatus::Pending.can_transition_to(&TrialStatus::Active));
        assert!(TrialStatus::Pending.can_transition_to(&TrialStatus::Converted));
        assert!(!TrialStatus::Pending.can_transition_to(&TrialStatus::Expired));
    }

    #[test]
    fn active_may_extend_in_place() {
        assert!(TrialStatus::Active.can_transition_to(&TrialStatus::Active));
    }

    #[test]
    fn converted_never_expires() {
        assert!(!TrialStatus::Converted.can_transition_to(&TrialStatus::Expired));
        assert!(TrialStatus::Converted
            .transition_to(TrialStatus::Expired)
            .is_err());
    }

    #[test]
    fn expired_cannot_convert() {
        assert!(!TrialStatus::Expired.can_transition_to(&TrialStatus::Converted));
    }

    #[test]
    fn archived_is_terminal() {
        assert!(TrialStatus::Archived.is_terminal());
        assert!(!TrialStatus::Converted.is_terminal());
    }

    #[test]
    fn active_reaches_every_outcome() {
        use TrialStatus::*;
        assert_eq!(Active.valid_transitions(), vec![Active, Converted, Expired]);
        assert_eq!(Expired.valid_transitions(), vec![Archived]);
    }

    #[test]
    fn rejected_transition_keeps_both_states() {
        let err = TrialStatus::Archived
            .transition_to(TrialStatus::Active)
            .unwrap_err();
        assert_eq!(err.from, TrialStatus::Archived);
        assert_eq!(err.to, TrialStatus::Active);
    }
}
