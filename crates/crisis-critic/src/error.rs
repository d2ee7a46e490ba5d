//! Critic errors
//!
//! A rejected draft is not an error: it is an `Ok` verdict with findings.
//! These variants cover the cases where no verdict can be produced.

use crisis_graph::GraphError;
use crisis_scenario::ComplianceStandard;

/// Reasons the critic could not judge a draft
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriticError {
    /// Graph store failed
    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    /// No compliance framework registered for the scenario's standard
    #[error("no compliance framework registered for {0}")]
    UnsupportedStandard(ComplianceStandard),
}

impl CriticError {
    /// Whether the run must stop
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Graph(e) => e.is_fatal(),
            Self::UnsupportedStandard(_) => true,
        }
    }
}
