//! Crisis Scenario - timeline model and persistence
//!
//! Shared by the critic and the orchestrator:
//! - Injects, crisis phases and `T+[DD:]HH:MM` time offsets
//! - The per-run [`ScenarioState`] aggregate
//! - Persisted [`ScenarioRecord`]s behind the [`ScenarioRepository`] trait

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod inject;
pub mod repository;
pub mod state;
pub mod types;

pub use error::ScenarioError;
pub use inject::{Inject, TechnicalMetadata};
pub use repository::{
    InMemoryRepository, JsonFileRepository, ScenarioFilter, ScenarioRecord, ScenarioRepository,
};
pub use state::ScenarioState;
pub use types::{
    ComplianceStandard, CrisisPhase, InjectId, InjectSeverity, Modality, ScenarioId, ScenarioType,
    TimeOffset,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
