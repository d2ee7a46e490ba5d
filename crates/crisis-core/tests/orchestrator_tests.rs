//! End-to-end runs of the scenario workflow

use async_trait::async_trait;
use crisis_core::prelude::*;
use crisis_core::{DraftResponse, ManagerPlanner, PlanDecision, StateView};
use crisis_graph::{Criticality, EntityStatus};
use crisis_scenario::InjectId;
use crisis_test_utils::{bank_store, inject, orchestrator, scripted, two_node_store, ScriptedProducer};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn attack_on(id: &str) -> CandidateAction {
    CandidateAction::new(format!("Attacker pivots onto {id}"))
        .with_technique("T1021")
        .with_target(id.into(), Criticality::Important)
        .with_effect(EntityStatus::Compromised)
}

#[tokio::test]
async fn zero_iterations_terminates_immediately() {
    let (orch, repository) = orchestrator(
        bank_store(),
        Collaborators::reference(42),
        EngineConfig::default().with_max_iterations(0),
    );

    let state = orch.generate(ScenarioType::Ransomware, None).await.unwrap();

    assert!(state.injects.is_empty());
    assert!(state.errors.is_empty());
    assert!(state.warnings.is_empty());
    let record = repository.load(&state.scenario_id).await.unwrap();
    assert!(record.injects.is_empty());
}

#[tokio::test]
async fn reference_run_builds_a_consistent_timeline() {
    let store = bank_store();
    let (orch, repository) = orchestrator(
        store.clone(),
        Collaborators::reference(42),
        EngineConfig::default().with_max_iterations(7),
    );

    let state = orch
        .generate(ScenarioType::Ransomware, Some("analyst".into()))
        .await
        .unwrap();

    assert_eq!(state.injects.len(), 7);
    assert_eq!(state.iteration, 7);
    assert_eq!(state.abandoned_actions, 0);
    assert_eq!(state.current_phase, CrisisPhase::Recovery);

    let ids: HashSet<&InjectId> = state.injects.iter().map(|i| &i.inject_id).collect();
    assert_eq!(ids.len(), state.injects.len());

    for pair in state.injects.windows(2) {
        assert!(pair[0].time_offset <= pair[1].time_offset);
        assert!(pair[0].phase <= pair[1].phase);
    }

    for inject in &state.injects {
        for asset in inject.affected_assets() {
            assert!(store.contains_entity(asset).unwrap(), "{asset} missing");
        }
        for (asset, status) in inject.status_changes() {
            let history = store.status_history(&asset).unwrap();
            assert!(history
                .iter()
                .any(|c| c.to == status
                    && c.causing_inject.as_deref() == Some(inject.inject_id.as_str())));
        }
    }

    let record = repository.load(&state.scenario_id).await.unwrap();
    assert_eq!(record.injects, state.injects);
    assert_eq!(record.user.as_deref(), Some("analyst"));
}

#[tokio::test]
async fn same_seed_same_timeline() {
    let run = || async {
        let (orch, _) = orchestrator(
            bank_store(),
            Collaborators::reference(9),
            EngineConfig::default().with_max_iterations(4),
        );
        orch.generate(ScenarioType::DataBreach, None).await.unwrap()
    };

    let (a, b) = (run().await, run().await);
    let contents = |s: &ScenarioState| s.injects.iter().map(|i| i.content.clone()).collect::<Vec<_>>();
    assert_eq!(contents(&a), contents(&b));
}

#[tokio::test]
async fn rejected_draft_is_refined_with_feedback() {
    let producer = Arc::new(ScriptedProducer::new(vec![DraftResponse::Draft(
        inject(1, 15, CrisisPhase::NormalOperation, "Too short").with_asset("A"),
    )]));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer.clone());
    let (orch, _) = orchestrator(
        two_node_store(),
        collaborators,
        EngineConfig::default().with_max_iterations(1),
    );

    let state = orch.generate(ScenarioType::Ransomware, None).await.unwrap();

    assert_eq!(state.injects.len(), 1);
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].contains("content_too_short"));

    let requests = producer.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].attempt, 1);
    assert!(requests[1].feedback.iter().any(|f| f.code == "content_too_short"));
    assert_eq!(state.refine_count, 0);
}

#[tokio::test]
async fn persistent_failures_abandon_actions_then_end() {
    let malformed = || DraftResponse::Malformed {
        raw: "{\"inject\":".to_string(),
    };
    let producer = Arc::new(ScriptedProducer::new((0..10).map(|_| malformed()).collect()));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer.clone());
    let config = EngineConfig::default()
        .with_max_iterations(3)
        .with_max_refinements(1)
        .with_max_abandoned_actions(2);
    let (orch, _) = orchestrator(two_node_store(), collaborators, config);

    let state = orch.generate(ScenarioType::Ransomware, None).await.unwrap();

    assert!(state.injects.is_empty());
    assert_eq!(state.abandoned_actions, 2);

    let requests = producer.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].action, attack_on("A"));
    assert_eq!(requests[2].action, CandidateAction::fallback(CrisisPhase::NormalOperation));

    let abandoned = state
        .warnings
        .iter()
        .filter(|w| w.contains("retry budget exceeded"))
        .count();
    assert_eq!(abandoned, 2);
    assert!(state.warnings.iter().any(|w| w.contains("malformed response")));
    assert!(state.warnings.last().unwrap().contains("abandoned actions"));
}

#[tokio::test]
async fn producer_timeout_counts_as_rejection() {
    let producer = Arc::new(ScriptedProducer::stalled(Duration::from_millis(500)));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer);
    let config = EngineConfig::default()
        .with_max_iterations(1)
        .with_max_refinements(0)
        .with_max_abandoned_actions(1)
        .with_collaborator_timeout(Duration::from_millis(20));
    let (orch, _) = orchestrator(two_node_store(), collaborators, config);

    let state = orch.generate(ScenarioType::Ransomware, None).await.unwrap();

    assert!(state.injects.is_empty());
    assert!(state.errors.iter().any(|e| e.contains("timed out after 20 ms")));
    assert_eq!(state.abandoned_actions, 1);
}

/// Continues in normal operation and raises the cancel flag on its second call
struct CancellingPlanner {
    cancel: watch::Sender<bool>,
    calls: AtomicUsize,
}

#[async_trait]
impl ManagerPlanner for CancellingPlanner {
    async fn plan(&self, _view: &StateView, _state: &ScenarioState) -> PlanDecision {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
            let _ = self.cancel.send(true);
        }
        PlanDecision::Continue {
            phase: CrisisPhase::NormalOperation,
            objective: "Keep going".to_string(),
        }
    }
}

#[tokio::test]
async fn cancellation_keeps_committed_injects() {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let producer = Arc::new(ScriptedProducer::new(Vec::new()));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer)
        .with_manager(Arc::new(CancellingPlanner {
            cancel: cancel_tx,
            calls: AtomicUsize::new(0),
        }));
    let (orch, repository) = orchestrator(
        two_node_store(),
        collaborators,
        EngineConfig::default().with_max_iterations(5),
    );
    let state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 5);
    let id = state.scenario_id;

    let err = orch.run(state, cancel_rx).await.unwrap_err();

    assert_eq!(err, EngineError::Cancelled { scenario_id: id, committed: 1 });
    let record = repository.load(&id).await.unwrap();
    assert_eq!(record.injects.len(), 1);
    assert!(!orch.is_running(&id));
}

#[tokio::test]
async fn second_run_of_same_scenario_is_refused() {
    let producer = Arc::new(ScriptedProducer::stalled(Duration::from_millis(50)));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer);
    let store = two_node_store();
    let (orch, _) = orchestrator(
        store.clone(),
        collaborators,
        EngineConfig::default().with_max_iterations(1),
    );

    let state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 1);
    let (_tx, rx) = watch::channel(false);

    let (first, second) = tokio::join!(
        orch.run(state.clone(), rx.clone()),
        orch.run(state.clone(), rx.clone())
    );

    assert_eq!(first.unwrap().injects.len(), 1);
    assert_eq!(second.unwrap_err(), EngineError::ScenarioAlreadyRunning(state.scenario_id));
    assert_eq!(store.active_runs(), 0);
}

#[tokio::test]
async fn disconnected_store_is_fatal() {
    let store = two_node_store();
    store.disconnect();
    let (orch, repository) = orchestrator(store, Collaborators::reference(1), EngineConfig::default());

    let err = orch.generate(ScenarioType::Ransomware, None).await.unwrap_err();

    assert!(err.is_connection());
    assert!(!err.is_recoverable());
    assert!(repository.is_empty());
}

#[tokio::test]
async fn seeding_is_refused_while_a_run_holds_the_store() {
    let producer = Arc::new(ScriptedProducer::stalled(Duration::from_millis(50)));
    let collaborators = scripted(CrisisPhase::NormalOperation, vec![attack_on("A")], producer);
    let store = two_node_store();
    let (orch, _) = orchestrator(
        store.clone(),
        collaborators,
        EngineConfig::default().with_max_iterations(1),
    );

    let reseed = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.seed(&TopologyTemplate::new("empty"), true)
    };
    let (run, seeded) = tokio::join!(orch.generate(ScenarioType::Ransomware, None), reseed);

    assert_eq!(run.unwrap().injects.len(), 1);
    assert!(seeded.is_err());
    assert!(store.seed(&TopologyTemplate::new("empty"), true).is_ok());
}
