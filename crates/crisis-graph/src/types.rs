//! Core types for the infrastructure graph
//!
//! Defines the vocabulary shared by the store, the critic and the orchestrator:
//! - Entity identifiers, types, statuses and criticality
//! - Typed directed relationships and the causal subset
//! - Snapshots and status-change records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Unique entity identifier (e.g. `DB-01`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create new entity ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of infrastructure entity
///
/// The set is open: unknown kinds loaded from templates are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Server,
    Database,
    Application,
    Network,
    Department,
    Workstation,
    Other(String),
}

impl EntityType {
    /// Canonical name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Server => "Server",
            Self::Database => "Database",
            Self::Application => "Application",
            Self::Network => "Network",
            Self::Department => "Department",
            Self::Workstation => "Workstation",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "server" => Self::Server,
            "database" => Self::Database,
            "application" => Self::Application,
            "network" => Self::Network,
            "department" => Self::Department,
            "workstation" => Self::Workstation,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityStatus {
    Online,
    Operational,
    Degraded,
    Offline,
    Compromised,
    Encrypted,
    Suspicious,
    Other(String),
}

impl EntityStatus {
    /// Canonical lowercase name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Operational => "operational",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
            Self::Compromised => "compromised",
            Self::Encrypted => "encrypted",
            Self::Suspicious => "suspicious",
            Self::Other(name) => name,
        }
    }

    /// Attacker holds the entity (compromised or encrypted)
    #[inline]
    #[must_use]
    pub fn is_compromise_class(&self) -> bool {
        matches!(self, Self::Compromised | Self::Encrypted)
    }

    /// Attacker presence is known or suspected
    #[inline]
    #[must_use]
    pub fn indicates_adversary(&self) -> bool {
        matches!(self, Self::Compromised | Self::Encrypted | Self::Suspicious)
    }

    /// Nominal service state
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Online | Self::Operational)
    }
}

impl Default for EntityStatus {
    fn default() -> Self {
        Self::Online
    }
}

impl From<String> for EntityStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "online" => Self::Online,
            "operational" => Self::Operational,
            "degraded" => Self::Degraded,
            "offline" => Self::Offline,
            "compromised" => Self::Compromised,
            "encrypted" => Self::Encrypted,
            "suspicious" => Self::Suspicious,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EntityStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<EntityStatus> for String {
    fn from(value: EntityStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business criticality, ordered from least to most critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    #[default]
    Standard,
    Important,
    Critical,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Important => f.write_str("important"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// Typed directed relationship between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    RunsOn,
    Uses,
    DependsOn,
    ConnectsTo,
    Requires,
    BacksUp,
    Monitors,
    Manages,
    RoutesTo,
}

impl RelationshipType {
    /// Relationship types that carry impact and causality
    pub const CAUSAL: [RelationshipType; 5] = [
        Self::RunsOn,
        Self::Uses,
        Self::DependsOn,
        Self::ConnectsTo,
        Self::Requires,
    ];

    /// Whether this edge participates in reachability reasoning
    #[inline]
    #[must_use]
    pub fn is_causal(self) -> bool {
        Self::CAUSAL.contains(&self)
    }

    /// Wire name (e.g. `RUNS_ON`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunsOn => "RUNS_ON",
            Self::Uses => "USES",
            Self::DependsOn => "DEPENDS_ON",
            Self::ConnectsTo => "CONNECTS_TO",
            Self::Requires => "REQUIRES",
            Self::BacksUp => "BACKS_UP",
            Self::Monitors => "MONITORS",
            Self::Manages => "MANAGES",
            Self::RoutesTo => "ROUTES_TO",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNS_ON" => Ok(Self::RunsOn),
            "USES" => Ok(Self::Uses),
            "DEPENDS_ON" => Ok(Self::DependsOn),
            "CONNECTS_TO" => Ok(Self::ConnectsTo),
            "REQUIRES" => Ok(Self::Requires),
            "BACKS_UP" => Ok(Self::BacksUp),
            "MONITORS" => Ok(Self::Monitors),
            "MANAGES" => Ok(Self::Manages),
            "ROUTES_TO" => Ok(Self::RoutesTo),
            other => Err(format!("unknown relationship type: {other}")),
        }
    }
}

/// A node in the infrastructure graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,
    /// Entity kind
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Human-readable name
    pub name: String,
    /// Current status
    #[serde(default)]
    pub status: EntityStatus,
    /// Business criticality
    #[serde(default)]
    pub criticality: Criticality,
}

impl Entity {
    /// Create an online, standard-criticality entity
    #[must_use]
    pub fn new(
        id: impl Into<EntityId>,
        entity_type: impl Into<EntityType>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: name.into(),
            status: EntityStatus::Online,
            criticality: Criticality::Standard,
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = status;
        self
    }

    /// With criticality
    #[inline]
    #[must_use]
    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }
}

/// A directed edge as declared in a topology template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Edge origin
    pub source: EntityId,
    /// Edge destination
    pub target: EntityId,
    /// Edge type
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

impl Relationship {
    /// Create new relationship
    #[must_use]
    pub fn new(
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type,
        }
    }
}

/// Outgoing edge as seen from a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingRelationship {
    pub target: EntityId,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

/// Entity plus its outgoing relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(flatten)]
    pub entity: Entity,
    pub relationships: Vec<OutgoingRelationship>,
}

/// Audit record for a single status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Store-wide monotonically increasing sequence number
    pub sequence: u64,
    pub entity_id: EntityId,
    pub from: EntityStatus,
    pub to: EntityStatus,
    /// Inject that caused the change, if any
    pub causing_inject: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of a bulk topology load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeedReport {
    pub entities: usize,
    pub relationships: usize,
    pub cleared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively_and_keeps_unknowns() {
        assert_eq!(EntityStatus::from("Compromised"), EntityStatus::Compromised);
        assert_eq!(
            EntityStatus::from("quarantined"),
            EntityStatus::Other("quarantined".to_string())
        );
        assert_eq!(EntityStatus::Other("quarantined".into()).as_str(), "quarantined");
    }

    #[test]
    fn causal_whitelist() {
        assert!(RelationshipType::RunsOn.is_causal());
        assert!(RelationshipType::Requires.is_causal());
        assert!(!RelationshipType::BacksUp.is_causal());
        assert!(!RelationshipType::Monitors.is_causal());
        assert!(!RelationshipType::RoutesTo.is_causal());
    }

    #[test]
    fn entity_serde_uses_wire_names() {
        let entity = Entity::new("DB-01", "Database", "Core DB")
            .with_status(EntityStatus::Degraded)
            .with_criticality(Criticality::Critical);
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Database");
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["criticality"], "critical");

        let rel: Relationship =
            serde_json::from_str(r#"{"source":"A","target":"B","type":"DEPENDS_ON"}"#).unwrap();
        assert_eq!(rel.relationship_type, RelationshipType::DependsOn);
    }

    #[test]
    fn criticality_orders_by_importance() {
        assert!(Criticality::Critical > Criticality::Important);
        assert!(Criticality::Important > Criticality::Standard);
    }
}
