//! Collaborator contracts
//!
//! The orchestrator plans, drafts and selects through these traits. Every
//! response is a tagged variant so the loop never inspects ad hoc shapes.
//! Deterministic reference implementations live in the submodules.

pub mod planner;
pub mod producer;
pub mod selector;

use async_trait::async_trait;
use crisis_critic::{Finding, Requirement};
use crisis_graph::{Criticality, EntityId, EntitySnapshot, EntityStatus};
use crisis_scenario::{ComplianceStandard, CrisisPhase, Inject, InjectId, ScenarioState, TimeOffset};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use planner::{GraphIntelPlanner, PlaybookPlanner};
pub use producer::TemplateContentProducer;
pub use selector::CriticalityActionSelector;

/// Graph snapshot taken at `STATE_CHECK`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateView {
    /// Ordered by entity id
    pub entities: Vec<EntitySnapshot>,
}

impl StateView {
    #[must_use]
    pub fn new(entities: Vec<EntitySnapshot>) -> Self {
        Self { entities }
    }

    /// Look up one entity
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&EntitySnapshot> {
        self.entities
            .binary_search_by(|e| e.entity.id.cmp(id))
            .ok()
            .map(|idx| &self.entities[idx])
    }

    /// Display name of `id`, falling back to the id itself
    #[must_use]
    pub fn name_of(&self, id: &EntityId) -> String {
        self.entity(id)
            .map_or_else(|| id.to_string(), |e| e.entity.name.clone())
    }

    /// Targets of causal edges leaving `id`
    #[must_use]
    pub fn causal_successors(&self, id: &EntityId) -> Vec<&EntityId> {
        self.entity(id)
            .map(|e| {
                e.relationships
                    .iter()
                    .filter(|r| r.relationship_type.is_causal())
                    .map(|r| &r.target)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Abstract next step chosen by the planners
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateAction {
    /// MITRE ATT&CK technique id
    pub technique: Option<String>,
    pub target: Option<EntityId>,
    pub description: String,
    /// Status the target moves to once the inject commits
    pub status_effect: Option<EntityStatus>,
    pub criticality: Criticality,
}

impl CandidateAction {
    /// Narrative action with no target
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            technique: None,
            target: None,
            description: description.into(),
            status_effect: None,
            criticality: Criticality::Standard,
        }
    }

    /// Action used when planners offer nothing
    ///
    /// Carries no asset, so it always passes the causality check.
    #[must_use]
    pub fn fallback(phase: CrisisPhase) -> Self {
        let description = match phase {
            CrisisPhase::NormalOperation => "Routine operations update for the crisis team",
            CrisisPhase::SuspiciousActivity => "Situation update on the anomalies under review",
            CrisisPhase::InitialIncident => "Situation update on the confirmed incident",
            CrisisPhase::EscalationCrisis => "Situation update on the escalating crisis",
            CrisisPhase::Containment => "Status update on containment measures",
            CrisisPhase::Recovery => "Status update on service recovery",
        };
        Self::new(description)
    }

    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: EntityId, criticality: Criticality) -> Self {
        self.target = Some(target);
        self.criticality = criticality;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.technique = Some(technique.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_effect(mut self, status: EntityStatus) -> Self {
        self.status_effect = Some(status);
        self
    }
}

impl fmt::Display for CandidateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(technique) = &self.technique {
            write!(f, "{technique} ")?;
        }
        f.write_str(&self.description)?;
        if let Some(target) = &self.target {
            write!(f, " [{target}]")?;
        }
        Ok(())
    }
}

/// Manager planner output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanDecision {
    /// Keep generating in `phase` towards `objective`
    Continue { phase: CrisisPhase, objective: String },
    /// Stop the run
    End { reason: String },
}

/// Everything a producer needs to draft one inject
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub inject_id: InjectId,
    pub phase: CrisisPhase,
    pub objective: String,
    pub action: CandidateAction,
    /// Earliest admissible time offset
    pub not_before: TimeOffset,
    pub standard: ComplianceStandard,
    /// Mandatory requirements in force for `phase`
    pub requirements: Vec<Requirement>,
    pub view: Arc<StateView>,
    pub prior_injects: Vec<Inject>,
    /// Errors of the previous attempt; empty on the first
    pub feedback: Vec<Finding>,
    /// Zero-based attempt number for this action
    pub attempt: u32,
}

/// Producer output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftResponse {
    Draft(Inject),
    /// Output that could not be turned into an inject
    Malformed { raw: String },
}

/// Picks the phase and objective of the next inject
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagerPlanner: Send + Sync {
    async fn plan(&self, view: &StateView, state: &ScenarioState) -> PlanDecision;
}

/// Proposes concrete actions for a phase
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntelPlanner: Send + Sync {
    async fn gather(
        &self,
        view: &StateView,
        state: &ScenarioState,
        phase: CrisisPhase,
    ) -> Vec<CandidateAction>;
}

/// Chooses one action among candidates
#[async_trait]
pub trait ActionSelector: Send + Sync {
    async fn select(
        &self,
        candidates: &[CandidateAction],
        state: &ScenarioState,
    ) -> Option<CandidateAction>;
}

/// Turns an action into a concrete inject
#[async_trait]
pub trait ContentProducer: Send + Sync {
    async fn draft(&self, request: &DraftRequest) -> DraftResponse;
}

/// The four collaborators of a run
#[derive(Clone)]
pub struct Collaborators {
    pub manager: Arc<dyn ManagerPlanner>,
    pub intel: Arc<dyn IntelPlanner>,
    pub selector: Arc<dyn ActionSelector>,
    pub producer: Arc<dyn ContentProducer>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Deterministic reference collaborators seeded with `seed`
    #[must_use]
    pub fn reference(seed: u64) -> Self {
        Self {
            manager: Arc::new(PlaybookPlanner::new()),
            intel: Arc::new(GraphIntelPlanner::new()),
            selector: Arc::new(CriticalityActionSelector::new(seed)),
            producer: Arc::new(TemplateContentProducer::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_manager(mut self, manager: Arc<dyn ManagerPlanner>) -> Self {
        self.manager = manager;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_intel(mut self, intel: Arc<dyn IntelPlanner>) -> Self {
        self.intel = intel;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn ActionSelector>) -> Self {
        self.selector = selector;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_producer(mut self, producer: Arc<dyn ContentProducer>) -> Self {
        self.producer = producer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crisis_graph::{Entity, OutgoingRelationship, RelationshipType};

    fn view() -> StateView {
        let snap = |id: &str, edges: Vec<(&str, RelationshipType)>| EntitySnapshot {
            entity: Entity::new(id, "Server", format!("Host {id}")),
            relationships: edges
                .into_iter()
                .map(|(t, r)| OutgoingRelationship {
                    target: t.into(),
                    relationship_type: r,
                })
                .collect(),
        };
        StateView::new(vec![
            snap("A", vec![("B", RelationshipType::ConnectsTo), ("C", RelationshipType::BacksUp)]),
            snap("B", vec![]),
            snap("C", vec![]),
        ])
    }

    #[test]
    fn view_lookups() {
        let view = view();
        assert_eq!(view.name_of(&"B".into()), "Host B");
        assert_eq!(view.name_of(&"Z".into()), "Z");
        assert_eq!(view.causal_successors(&"A".into()), vec![&EntityId::from("B")]);
        assert!(view.causal_successors(&"Z".into()).is_empty());
    }

    #[test]
    fn fallback_has_no_asset() {
        for phase in CrisisPhase::ALL {
            let action = CandidateAction::fallback(phase);
            assert!(action.target.is_none());
            assert!(action.status_effect.is_none());
        }
    }

    #[test]
    fn action_display() {
        let action = CandidateAction::new("Lateral movement")
            .with_technique("T1021")
            .with_target("DB-01".into(), Criticality::Critical);
        assert_eq!(action.to_string(), "T1021 Lateral movement [DB-01]");
    }
}
