//! Declarative topology templates
//!
//! Templates are YAML or JSON documents listing entities and edges. They are
//! the only input to [`StateStore::seed`](crate::StateStore::seed).

use crate::error::GraphError;
use crate::types::{Entity, EntityId, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const FINANCIAL_INSTITUTION: &str = include_str!("../templates/financial_institution.yaml");

/// Names of the templates compiled into the crate
pub const BUILTIN_TEMPLATES: &[&str] = &["financial_institution"];

/// Entity and edge list consumed by `seed`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entities: Vec<Entity>,
    #[serde(default, alias = "edges")]
    pub relationships: Vec<Relationship>,
}

impl TopologyTemplate {
    /// Create empty template
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an entity
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a relationship
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> Result<Self, GraphError> {
        serde_yaml::from_str(source).map_err(|e| GraphError::Template(e.to_string()))
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> Result<Self, GraphError> {
        serde_json::from_str(source).map_err(|e| GraphError::Template(e.to_string()))
    }

    /// Load from disk; `.json` files are read as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Template(format!("{}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Look up a built-in template by name
    pub fn builtin(name: &str) -> Result<Self, GraphError> {
        match name {
            "financial_institution" => Self::from_yaml_str(FINANCIAL_INSTITUTION),
            other => Err(GraphError::Template(format!(
                "unknown built-in template '{other}' (available: {})",
                BUILTIN_TEMPLATES.join(", ")
            ))),
        }
    }

    /// Validate as a standalone topology
    pub fn validate(&self) -> Result<(), GraphError> {
        self.validate_against(&HashSet::new())
    }

    /// Validate allowing edges to reference `existing` entities
    ///
    /// Rejects duplicate ids, self-loops and dangling endpoints.
    pub fn validate_against(&self, existing: &HashSet<EntityId>) -> Result<(), GraphError> {
        let mut declared = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            if !declared.insert(&entity.id) || existing.contains(&entity.id) {
                return Err(GraphError::DuplicateEntity(entity.id.clone()));
            }
        }

        for rel in &self.relationships {
            let invalid = |reason: &str| GraphError::InvalidRelationship {
                from: rel.source.clone(),
                to: rel.target.clone(),
                relationship: rel.relationship_type,
                reason: reason.to_string(),
            };

            if rel.source == rel.target {
                return Err(invalid("self-loop"));
            }
            if !declared.contains(&rel.source) && !existing.contains(&rel.source) {
                return Err(invalid("unknown source entity"));
            }
            if !declared.contains(&rel.target) && !existing.contains(&rel.target) {
                return Err(invalid("unknown target entity"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityStatus, RelationshipType};

    #[test]
    fn builtin_template_is_valid() {
        let template = TopologyTemplate::builtin("financial_institution").unwrap();
        assert!(template.entities.len() >= 15);
        assert!(!template.relationships.is_empty());
        template.validate().unwrap();
    }

    #[test]
    fn unknown_builtin_lists_alternatives() {
        let err = TopologyTemplate::builtin("hospital").unwrap_err();
        assert!(err.to_string().contains("financial_institution"));
    }

    #[test]
    fn yaml_accepts_edges_alias_and_defaults() {
        let yaml = r"
name: tiny
entities:
  - { id: A, type: Server, name: Alpha }
  - { id: B, type: Database, name: Beta, status: degraded, criticality: critical }
edges:
  - { source: A, target: B, type: DEPENDS_ON }
";
        let template = TopologyTemplate::from_yaml_str(yaml).unwrap();
        assert_eq!(template.entities[0].status, EntityStatus::Online);
        assert_eq!(template.entities[1].status, EntityStatus::Degraded);
        assert_eq!(
            template.relationships[0].relationship_type,
            RelationshipType::DependsOn
        );
    }

    #[test]
    fn rejects_self_loops_duplicates_and_dangling_edges() {
        let base = TopologyTemplate::new("t")
            .with_entity(Entity::new("A", "Server", "a"))
            .with_entity(Entity::new("B", "Server", "b"));

        let looped = base
            .clone()
            .with_relationship(Relationship::new("A", "A", RelationshipType::Uses));
        assert!(matches!(
            looped.validate(),
            Err(GraphError::InvalidRelationship { .. })
        ));

        let dangling = base
            .clone()
            .with_relationship(Relationship::new("A", "Z", RelationshipType::Uses));
        assert!(dangling.validate().is_err());

        let duplicated = base.clone().with_entity(Entity::new("A", "Server", "again"));
        assert_eq!(
            duplicated.validate(),
            Err(GraphError::DuplicateEntity("A".into()))
        );

        let existing: HashSet<EntityId> = ["Z".into()].into_iter().collect();
        dangling.validate_against(&existing).unwrap();
    }
}
