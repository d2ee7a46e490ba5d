//! Error types for the graph state store

use crate::types::{EntityId, RelationshipType};

/// Graph store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Backend unreachable; fatal to a generation run
    #[error("graph store unavailable: {0}")]
    Connection(String),

    /// Referenced entity does not exist
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity id declared twice
    #[error("duplicate entity: {0}")]
    DuplicateEntity(EntityId),

    /// Edge rejected at load time
    #[error("invalid relationship {from} -[{relationship}]-> {to}: {reason}")]
    InvalidRelationship {
        from: EntityId,
        to: EntityId,
        relationship: RelationshipType,
        reason: String,
    },

    /// Destructive operation refused while runs are active
    #[error("store busy: {active_runs} generation run(s) hold a lease")]
    Busy { active_runs: usize },

    /// Template could not be read or parsed
    #[error("invalid topology template: {0}")]
    Template(String),
}

impl GraphError {
    /// Check if error must abort the current run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if error refers to a missing entity
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(GraphError::Connection("down".into()).is_fatal());
        assert!(!GraphError::EntityNotFound("X".into()).is_fatal());
        assert!(GraphError::EntityNotFound("X".into()).is_not_found());
        assert!(!GraphError::Busy { active_runs: 1 }.is_not_found());
    }

    #[test]
    fn display_names_the_edge() {
        let err = GraphError::InvalidRelationship {
            from: "A".into(),
            to: "A".into(),
            relationship: RelationshipType::Uses,
            reason: "self-loop".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid relationship A -[USES]-> A: self-loop"
        );
    }
}
