//! Transition tables for persisted lifecycle states.
//!
//! A status enum lists its states once and answers whether an edge exists.
//! Reachable states and terminality follow from that single table, so the
//! two can never disagree.

use std::fmt;
use thiserror::Error;

/// An edge the table does not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transition from {from:?} to {to:?}")]
pub struct TransitionRejected<S: fmt::Debug> {
    pub from: S,
    pub to: S,
}

pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug + 'static {
    /// Every state, in declaration order.
    const STATES: &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool;

    /// States one edge away, in declaration order.
    fn valid_transitions(&self) -> Vec<Self> {
        Self::STATES
            .iter()
            .copied()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }

    fn transition_to(&self, target: Self) -> Result<Self, TransitionRejected<Self>> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(TransitionRejected {
                from: *self,
                to: target,
            })
        }
    }

    /// No outgoing edge, including a self-loop.
    fn is_terminal(&self) -> bool {
        !Self::STATES.iter().any(|target| self.can_transition_to(target))
    }
}
