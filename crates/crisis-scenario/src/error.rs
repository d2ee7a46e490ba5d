//! Scenario model errors

use crate::types::ScenarioId;

/// Errors raised by the scenario model and repositories
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    /// No record stored under this id
    #[error("scenario not found: {0}")]
    NotFound(ScenarioId),

    /// Malformed `T+[DD:]HH:MM` offset
    #[error("invalid time offset '{0}': expected T+HH:MM or T+DD:HH:MM")]
    InvalidTimeOffset(String),

    /// Unknown compliance standard name
    #[error("unknown compliance standard: {0}")]
    UnknownStandard(String),

    /// Unknown crisis phase name
    #[error("unknown crisis phase: {0}")]
    UnknownPhase(String),

    /// Malformed scenario id
    #[error("invalid scenario id '{0}'")]
    InvalidScenarioId(String),

    /// Storage I/O failed
    #[error("storage error: {0}")]
    Io(String),

    /// Record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ScenarioError {
    /// Whether the error refers to a missing record
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for ScenarioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
