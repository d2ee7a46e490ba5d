//! Scenario workflow state machine
//!
//! `STATE_CHECK -> PLAN -> INTEL -> ACTION_SELECT -> DRAFT -> VALIDATE`, then
//! `COMMIT -> STATE_CHECK` on acceptance or `REFINE -> DRAFT` on rejection.
//! `REFINE -> ACTION_SELECT` abandons the current action. `END` is terminal.

use crate::error::EngineError;
use serde::Serialize;
use std::fmt;

/// Step of the generation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    StateCheck,
    Plan,
    Intel,
    ActionSelect,
    Draft,
    Validate,
    Commit,
    Refine,
    End,
}

impl WorkflowStep {
    /// Whether the loop stops here
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::End
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StateCheck => "STATE_CHECK",
            Self::Plan => "PLAN",
            Self::Intel => "INTEL",
            Self::ActionSelect => "ACTION_SELECT",
            Self::Draft => "DRAFT",
            Self::Validate => "VALIDATE",
            Self::Commit => "COMMIT",
            Self::Refine => "REFINE",
            Self::End => "END",
        };
        f.write_str(s)
    }
}

/// Steps reachable from `from`
#[must_use]
pub fn allowed_transitions(from: WorkflowStep) -> &'static [WorkflowStep] {
    use WorkflowStep::*;
    match from {
        StateCheck => &[Plan, End],
        Plan => &[Intel, End],
        Intel => &[ActionSelect],
        ActionSelect => &[Draft, End],
        Draft => &[Validate, Refine],
        Validate => &[Commit, Refine],
        Commit => &[StateCheck],
        Refine => &[Draft, ActionSelect],
        End => &[],
    }
}

/// Check a transition against the table
pub fn validate_transition(from: WorkflowStep, to: WorkflowStep) -> Result<(), EngineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EngineError::IllegalTransition { from, to })
    }
}
