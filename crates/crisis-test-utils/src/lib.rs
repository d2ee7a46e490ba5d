//! Testing utilities for the crisis engine workspace
//!
//! Shared stores, scenario fixtures and scripted collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use crisis_core::{
    ActionSelector, CandidateAction, Collaborators, ContentProducer, DraftRequest, DraftResponse,
    EngineConfig, IntelPlanner, ManagerPlanner, PlanDecision, ScenarioOrchestrator, StateView,
    TemplateContentProducer,
};
use crisis_graph::{Entity, GraphStore, Relationship, RelationshipType, TopologyTemplate};
use crisis_scenario::{
    ComplianceStandard, CrisisPhase, InMemoryRepository, Inject, InjectId, ScenarioState,
    ScenarioType, TimeOffset,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// `A --DEPENDS_ON--> B`, both online
pub fn two_node_store() -> Arc<GraphStore> {
    let topology = TopologyTemplate::new("two-node")
        .with_entity(Entity::new("A", "Server", "Server A"))
        .with_entity(Entity::new("B", "Database", "Database B"))
        .with_relationship(Relationship::new("A", "B", RelationshipType::DependsOn));
    Arc::new(GraphStore::from_template(&topology).unwrap())
}

/// Built-in financial institution topology
pub fn bank_store() -> Arc<GraphStore> {
    let topology = TopologyTemplate::builtin("financial_institution").unwrap();
    Arc::new(GraphStore::from_template(&topology).unwrap())
}

/// Empty ransomware scenario against `standard`
pub fn scenario(standard: ComplianceStandard, max_iterations: u32) -> ScenarioState {
    ScenarioState::new(ScenarioType::Ransomware, standard, max_iterations)
}

/// Inject `INJ-{n:03}` at `T+minutes`
pub fn inject(n: usize, minutes: u32, phase: CrisisPhase, content: &str) -> Inject {
    Inject::new(
        InjectId::sequential(n),
        TimeOffset::from_minutes(minutes),
        phase,
        content,
    )
}

/// Orchestrator over `store` with an in-memory repository the test can inspect
pub fn orchestrator(
    store: Arc<GraphStore>,
    collaborators: Collaborators,
    config: EngineConfig,
) -> (ScenarioOrchestrator, Arc<InMemoryRepository>) {
    let repository = Arc::new(InMemoryRepository::new());
    let orchestrator =
        ScenarioOrchestrator::new(store, collaborators, repository.clone(), config).unwrap();
    (orchestrator, repository)
}

/// Manager planner that always continues in one phase
#[derive(Debug, Clone)]
pub struct StaticPlanner {
    pub phase: CrisisPhase,
}

impl StaticPlanner {
    pub fn new(phase: CrisisPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl ManagerPlanner for StaticPlanner {
    async fn plan(&self, _view: &StateView, _state: &ScenarioState) -> PlanDecision {
        PlanDecision::Continue {
            phase: self.phase,
            objective: "Scripted objective".to_string(),
        }
    }
}

/// Intel planner returning a fixed candidate list
#[derive(Debug, Clone, Default)]
pub struct FixedIntel {
    pub candidates: Vec<CandidateAction>,
}

impl FixedIntel {
    pub fn new(candidates: Vec<CandidateAction>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl IntelPlanner for FixedIntel {
    async fn gather(
        &self,
        _view: &StateView,
        _state: &ScenarioState,
        _phase: CrisisPhase,
    ) -> Vec<CandidateAction> {
        self.candidates.clone()
    }
}

/// Always picks the first candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSelector;

#[async_trait]
impl ActionSelector for FirstSelector {
    async fn select(
        &self,
        candidates: &[CandidateAction],
        _state: &ScenarioState,
    ) -> Option<CandidateAction> {
        candidates.first().cloned()
    }
}

/// Producer replaying scripted responses, then delegating to the template producer
///
/// Every request is recorded so tests can inspect feedback and attempts.
#[derive(Debug, Default)]
pub struct ScriptedProducer {
    script: Mutex<VecDeque<DraftResponse>>,
    requests: Mutex<Vec<DraftRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProducer {
    pub fn new(script: Vec<DraftResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Producer that sleeps `delay` before every answer
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<DraftRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContentProducer for ScriptedProducer {
    async fn draft(&self, request: &DraftRequest) -> DraftResponse {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(response) => response,
            None => TemplateContentProducer::new().draft(request).await,
        }
    }
}

/// Static phase, fixed candidates, first-pick selector and `producer`
pub fn scripted(
    phase: CrisisPhase,
    candidates: Vec<CandidateAction>,
    producer: Arc<ScriptedProducer>,
) -> Collaborators {
    Collaborators::reference(7)
        .with_manager(Arc::new(StaticPlanner::new(phase)))
        .with_intel(Arc::new(FixedIntel::new(candidates)))
        .with_selector(Arc::new(FirstSelector))
        .with_producer(producer)
}
