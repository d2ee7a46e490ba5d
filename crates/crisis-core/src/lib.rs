//! Crisis Core - scenario workflow orchestration
//!
//! Produces an ordered timeline of crisis injects for a tabletop exercise:
//! - Plans each inject through pluggable collaborators
//! - Validates every draft with the causal and compliance critic
//! - Refines rejected drafts and abandons actions that keep failing
//! - Commits accepted injects to the infrastructure graph and the repository
//!
//! # Example
//!
//! ```rust,ignore
//! use crisis_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(GraphStore::from_template(&TopologyTemplate::builtin("financial_institution")?)?);
//! let orchestrator = ScenarioOrchestrator::new(
//!     store,
//!     Collaborators::reference(42),
//!     Arc::new(InMemoryRepository::new()),
//!     EngineConfig::default(),
//! )?;
//!
//! let state = orchestrator.generate(ScenarioType::Ransomware, None).await?;
//! println!("generated {} injects", state.injects.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod telemetry;
pub mod workflow;

pub use collaborators::{
    ActionSelector, CandidateAction, Collaborators, ContentProducer, CriticalityActionSelector,
    DraftRequest, DraftResponse, GraphIntelPlanner, IntelPlanner, ManagerPlanner, PlanDecision,
    PlaybookPlanner, StateView, TemplateContentProducer,
};
pub use config::EngineConfig;
pub use error::EngineError;
pub use orchestrator::ScenarioOrchestrator;
pub use workflow::{allowed_transitions, validate_transition, WorkflowStep};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running scenarios
    pub use crate::{
        CandidateAction, Collaborators, EngineConfig, EngineError, ScenarioOrchestrator,
        WorkflowStep,
    };
    pub use crisis_critic::{Critic, CriticConfig, CriticVerdict};
    pub use crisis_graph::{GraphStore, StateStore, TopologyTemplate};
    pub use crisis_scenario::{
        ComplianceStandard, CrisisPhase, InMemoryRepository, Inject, JsonFileRepository,
        ScenarioRepository, ScenarioState, ScenarioType, TimeOffset,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
