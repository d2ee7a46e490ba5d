//! Crisis Graph - infrastructure state store
//!
//! Owns the simulated IT topology used by scenario generation:
//! - Entities with open-ended types and statuses
//! - Typed directed relationships, a subset of which carry causality
//! - Bounded reachability and advisory cascading-impact reports
//! - Declarative YAML/JSON topology templates
//!
//! # Example
//!
//! ```rust,ignore
//! use crisis_graph::prelude::*;
//!
//! let template = TopologyTemplate::builtin("financial_institution")?;
//! let store = GraphStore::from_template(&template)?;
//!
//! let report = store.calculate_cascading_impact(
//!     &"NET-CORE".into(),
//!     &EntityStatus::Compromised,
//!     DEFAULT_MAX_DEPTH,
//! )?;
//! println!("{} dependents, severity {}", report.affected_count(), report.impact_severity);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod error;
pub mod impact;
pub mod store;
pub mod template;
pub mod types;

pub use api::{RunLease, StateStore, DEFAULT_MAX_DEPTH, DEFAULT_SNAPSHOT_LIMIT};
pub use error::GraphError;
pub use impact::{
    classify_severity, impact_score, AffectedEntity, ImpactReport, ImpactSeverity,
    RecoveryEstimate,
};
pub use store::GraphStore;
pub use template::{TopologyTemplate, BUILTIN_TEMPLATES};
pub use types::{
    Criticality, Entity, EntityId, EntitySnapshot, EntityStatus, EntityType,
    OutgoingRelationship, Relationship, RelationshipType, SeedReport, StatusChange,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the graph store
    pub use crate::{
        Entity, EntityId, EntityStatus, EntityType, GraphError, GraphStore, ImpactReport,
        ImpactSeverity, Relationship, RelationshipType, StateStore, TopologyTemplate,
        DEFAULT_MAX_DEPTH,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
