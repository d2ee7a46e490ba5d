//! Error types for the scenario engine
//!
//! Fatal variants stop a run and surface to the caller. Recoverable variants
//! are raised inside the loop, recorded on the scenario as errors or warnings
//! and drive refinement or re-planning.

use crate::workflow::WorkflowStep;
use crisis_critic::CriticError;
use crisis_graph::GraphError;
use crisis_scenario::{InjectId, ScenarioError, ScenarioId};

/// Main engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Graph store unreachable
    #[error("graph store unreachable: {0}")]
    Connection(String),

    /// Referenced entity or scenario missing
    #[error("not found: {0}")]
    NotFound(String),

    /// Other graph store failure
    #[error("graph error: {0}")]
    Graph(GraphError),

    /// Critic rejected a draft
    #[error("draft {inject_id} rejected: {}", reasons.join("; "))]
    ValidationRejection {
        inject_id: InjectId,
        reasons: Vec<String>,
    },

    /// Action abandoned after too many rejections
    #[error("retry budget exceeded for action '{action}' after {attempts} rejected drafts")]
    RetryBudgetExceeded { action: String, attempts: u32 },

    /// Collaborator returned output that could not be used
    #[error("malformed response from {collaborator} ({} bytes)", raw.len())]
    MalformedCollaboratorResponse {
        collaborator: &'static str,
        raw: String,
    },

    /// Collaborator did not answer in time
    #[error("{collaborator} timed out after {timeout_ms} ms")]
    Timeout {
        collaborator: &'static str,
        timeout_ms: u64,
    },

    /// Run cancelled; committed injects are kept
    #[error("scenario {scenario_id} cancelled after {committed} committed injects")]
    Cancelled {
        scenario_id: ScenarioId,
        committed: usize,
    },

    /// A run for this scenario is already in progress
    #[error("scenario {0} is already running")]
    ScenarioAlreadyRunning(ScenarioId),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Scenario repository failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Critic could not produce a verdict
    #[error("critic error: {0}")]
    Critic(String),

    /// Workflow attempted a transition outside the table
    #[error("illegal workflow transition {from} -> {to}")]
    IllegalTransition { from: WorkflowStep, to: WorkflowStep },
}

impl EngineError {
    /// Check if the run can continue after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ValidationRejection { .. }
                | Self::RetryBudgetExceeded { .. }
                | Self::MalformedCollaboratorResponse { .. }
                | Self::Timeout { .. }
        )
    }

    /// Check if the error is the store being unreachable
    #[inline]
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Connection(msg) => Self::Connection(msg),
            GraphError::EntityNotFound(id) => Self::NotFound(format!("entity {id}")),
            other => Self::Graph(other),
        }
    }
}

impl From<CriticError> for EngineError {
    fn from(err: CriticError) -> Self {
        match err {
            CriticError::Graph(graph) => graph.into(),
            other => Self::Critic(other.to_string()),
        }
    }
}

impl From<ScenarioError> for EngineError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::NotFound(id) => Self::NotFound(format!("scenario {id}")),
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_errors_map_onto_taxonomy() {
        let err: EngineError = GraphError::Connection("refused".into()).into();
        assert!(err.is_connection());
        assert!(!err.is_recoverable());

        let err: EngineError = GraphError::EntityNotFound("DB-09".into()).into();
        assert_eq!(err, EngineError::NotFound("entity DB-09".into()));

        let err: EngineError = CriticError::Graph(GraphError::Connection("x".into())).into();
        assert!(err.is_connection());
    }

    #[test]
    fn loop_errors_are_recoverable() {
        assert!(EngineError::Timeout {
            collaborator: "content producer",
            timeout_ms: 10
        }
        .is_recoverable());
        assert!(EngineError::RetryBudgetExceeded {
            action: "T1021 on DB-01".into(),
            attempts: 4
        }
        .is_recoverable());
        assert!(!EngineError::ScenarioAlreadyRunning(ScenarioId::new()).is_recoverable());
    }

    #[test]
    fn rejection_lists_reasons() {
        let err = EngineError::ValidationRejection {
            inject_id: "INJ-002".into(),
            reasons: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "draft INJ-002 rejected: a; b");
    }
}
