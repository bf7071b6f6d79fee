//! Run state machine
//!
//! Forward-only lifecycle of one pipeline run:
//! - Safety: no transition re-enters an earlier state
//! - Termination: `Verified` and `Failed` accept no further events
//! - Determinism: unique next state per (state, event)

use crate::errors::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Problem classified and its node inserted
    Classified,

    /// Every node in the order has a binding
    Resolved,

    /// Every binding is within budget
    BudgetChecked,

    /// Every binding was executed
    Deployed,

    /// Every deployment was accepted (terminal)
    Verified,

    /// Some stage rejected the run (terminal)
    Failed,
}

/// Events that advance a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Resolver bound every node
    BindingsResolved,

    /// Budget gate admitted every binding
    BudgetPassed,

    /// Deployment gate ran every binding
    DeploymentsFinished,

    /// All deployment reports accepted
    Verify,

    /// Any stage rejected or errored
    Fail,
}

impl RunState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Verified | RunState::Failed)
    }

    /// Attempt a transition
    ///
    /// Valid transitions:
    /// 1. Classified    → Resolved       (BindingsResolved)
    /// 2. Resolved      → BudgetChecked  (BudgetPassed)
    /// 3. BudgetChecked → Deployed       (DeploymentsFinished)
    /// 4. Deployed      → Verified       (Verify)
    /// 5. any non-terminal → Failed      (Fail)
    pub fn transition(&self, event: RunEvent) -> Result<RunState> {
        use RunEvent::*;
        use RunState::*;

        let next = match (self, event) {
            (Classified, BindingsResolved) => Resolved,
            (Resolved, BudgetPassed) => BudgetChecked,
            (BudgetChecked, DeploymentsFinished) => Deployed,
            (Deployed, Verify) => Verified,
            (state, Fail) if !state.is_terminal() => Failed,
            (from, event) => {
                return Err(GateError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                })
            }
        };

        tracing::debug!(from = %self, to = %next, "run state transition");
        Ok(next)
    }

    /// Events accepted in this state
    pub fn valid_events(&self) -> Vec<RunEvent> {
        use RunEvent::*;
        use RunState::*;

        match self {
            Classified => vec![BindingsResolved, Fail],
            Resolved => vec![BudgetPassed, Fail],
            BudgetChecked => vec![DeploymentsFinished, Fail],
            Deployed => vec![Verify, Fail],
            Verified | Failed => vec![],
        }
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            RunState::Classified => "Classified",
            RunState::Resolved => "Resolved",
            RunState::BudgetChecked => "Budget Checked",
            RunState::Deployed => "Deployed",
            RunState::Verified => "Verified",
            RunState::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
