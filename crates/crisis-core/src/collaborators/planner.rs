//! Reference planners
//!
//! [`PlaybookPlanner`] walks a fixed phase playbook per scenario type.
//! [`GraphIntelPlanner`] derives candidate actions from the graph snapshot and
//! the assets the timeline has already touched, so every proposal has a
//! causal precedent.

use super::{CandidateAction, IntelPlanner, ManagerPlanner, PlanDecision, StateView};
use async_trait::async_trait;
use crisis_graph::{EntityId, EntityStatus, EntityType};
use crisis_scenario::{CrisisPhase, ScenarioState, ScenarioType};
use std::collections::BTreeSet;

type Stage = (CrisisPhase, &'static str);

const RANSOMWARE: &[Stage] = &[
    (CrisisPhase::SuspiciousActivity, "Establish a foothold through phishing"),
    (CrisisPhase::InitialIncident, "Harvest credentials and move laterally"),
    (CrisisPhase::InitialIncident, "Reach core infrastructure"),
    (CrisisPhase::EscalationCrisis, "Encrypt critical data stores"),
    (CrisisPhase::EscalationCrisis, "Disrupt customer-facing services"),
    (CrisisPhase::Containment, "Isolate compromised systems"),
    (CrisisPhase::Recovery, "Restore services from backup"),
];

const DATA_BREACH: &[Stage] = &[
    (CrisisPhase::SuspiciousActivity, "Establish a foothold through phishing"),
    (CrisisPhase::InitialIncident, "Abuse a privileged account"),
    (CrisisPhase::EscalationCrisis, "Stage and exfiltrate customer records"),
    (CrisisPhase::Containment, "Cut off attacker access"),
    (CrisisPhase::Recovery, "Restore trusted operations"),
];

const GENERIC: &[Stage] = &[
    (CrisisPhase::SuspiciousActivity, "Surface the first anomalies"),
    (CrisisPhase::InitialIncident, "Confirm the incident"),
    (CrisisPhase::EscalationCrisis, "Escalate business impact"),
    (CrisisPhase::Containment, "Contain the threat"),
    (CrisisPhase::Recovery, "Recover operations"),
];

/// Manager planner following a fixed playbook per scenario type
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybookPlanner;

impl PlaybookPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Playbook for `scenario_type`
    #[must_use]
    pub fn playbook(scenario_type: &ScenarioType) -> &'static [Stage] {
        match scenario_type {
            ScenarioType::Ransomware => RANSOMWARE,
            ScenarioType::DataBreach | ScenarioType::InsiderThreat => DATA_BREACH,
            _ => GENERIC,
        }
    }
}

#[async_trait]
impl ManagerPlanner for PlaybookPlanner {
    async fn plan(&self, _view: &StateView, state: &ScenarioState) -> PlanDecision {
        let stages = Self::playbook(&state.scenario_type);
        match stages.get(state.injects.len()) {
            // never step back behind the phase the timeline already reached
            Some((phase, objective)) => PlanDecision::Continue {
                phase: (*phase).max(state.current_phase),
                objective: (*objective).to_string(),
            },
            None => PlanDecision::End {
                reason: format!("{} playbook complete", state.scenario_type),
            },
        }
    }
}

/// Intel planner reading candidate actions off the graph
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphIntelPlanner;

impl GraphIntelPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn footholds(view: &StateView, phase: CrisisPhase) -> Vec<CandidateAction> {
        let effect = if phase <= CrisisPhase::SuspiciousActivity {
            EntityStatus::Suspicious
        } else {
            EntityStatus::Compromised
        };
        view.entities
            .iter()
            .filter(|e| e.entity.entity_type == EntityType::Workstation && e.entity.status.is_healthy())
            .map(|e| {
                CandidateAction::new(format!("Phishing email opened on {}", e.entity.name))
                    .with_technique("T1566")
                    .with_target(e.entity.id.clone(), e.entity.criticality)
                    .with_effect(effect.clone())
            })
            .collect()
    }

    fn advance(view: &StateView, touched: &BTreeSet<EntityId>, phase: CrisisPhase) -> Vec<CandidateAction> {
        let mut actions = Vec::new();

        for id in touched {
            let Some(snap) = view.entity(id) else { continue };
            let entity = &snap.entity;

            if entity.status == EntityStatus::Suspicious {
                actions.push(
                    CandidateAction::new(format!("Stolen credentials used on {}", entity.name))
                        .with_technique("T1078")
                        .with_target(entity.id.clone(), entity.criticality)
                        .with_effect(EntityStatus::Compromised),
                );
            }
            if phase == CrisisPhase::EscalationCrisis
                && entity.status == EntityStatus::Compromised
                && matches!(
                    entity.entity_type,
                    EntityType::Database | EntityType::Server | EntityType::Application
                )
            {
                actions.push(
                    CandidateAction::new(format!("Ransomware payload encrypts {}", entity.name))
                        .with_technique("T1486")
                        .with_target(entity.id.clone(), entity.criticality)
                        .with_effect(EntityStatus::Encrypted),
                );
            }
        }

        let frontier: BTreeSet<&EntityId> = touched
            .iter()
            .filter(|id| view.entity(id).is_some_and(|s| s.entity.status.indicates_adversary()))
            .flat_map(|id| view.causal_successors(id))
            .filter(|next| !touched.contains(*next))
            .collect();
        for id in frontier {
            let Some(snap) = view.entity(id) else { continue };
            if !snap.entity.status.is_healthy() {
                continue;
            }
            actions.push(
                CandidateAction::new(format!("Lateral movement reaches {}", snap.entity.name))
                    .with_technique("T1021")
                    .with_target(snap.entity.id.clone(), snap.entity.criticality)
                    .with_effect(EntityStatus::Compromised),
            );
        }
        actions
    }

    fn respond(view: &StateView, touched: &BTreeSet<EntityId>, phase: CrisisPhase) -> Vec<CandidateAction> {
        touched
            .iter()
            .filter_map(|id| view.entity(id))
            .filter_map(|snap| {
                let entity = &snap.entity;
                match phase {
                    CrisisPhase::Containment if entity.status.indicates_adversary() => Some(
                        CandidateAction::new(format!("Isolate {} from the network", entity.name))
                            .with_target(entity.id.clone(), entity.criticality)
                            .with_effect(EntityStatus::Offline),
                    ),
                    CrisisPhase::Recovery if !entity.status.is_healthy() => Some(
                        CandidateAction::new(format!("Restore {} from clean backup", entity.name))
                            .with_target(entity.id.clone(), entity.criticality)
                            .with_effect(EntityStatus::Online),
                    ),
                    _ => None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl IntelPlanner for GraphIntelPlanner {
    async fn gather(
        &self,
        view: &StateView,
        state: &ScenarioState,
        phase: CrisisPhase,
    ) -> Vec<CandidateAction> {
        let touched = state.affected_assets();
        let actions = match phase {
            CrisisPhase::Containment | CrisisPhase::Recovery => Self::respond(view, &touched, phase),
            _ if touched.is_empty() => Self::footholds(view, phase),
            _ => Self::advance(view, &touched, phase),
        };
        tracing::debug!(phase = %phase, candidates = actions.len(), "intel gathered");
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crisis_graph::{Criticality, Entity, EntitySnapshot, OutgoingRelationship, RelationshipType};
    use crisis_scenario::{ComplianceStandard, Inject, InjectId, TimeOffset};

    fn snap(id: &str, kind: &str, status: EntityStatus, edges: &[&str]) -> EntitySnapshot {
        EntitySnapshot {
            entity: Entity::new(id, kind, format!("{kind} {id}"))
                .with_status(status)
                .with_criticality(Criticality::Important),
            relationships: edges
                .iter()
                .map(|t| OutgoingRelationship {
                    target: (*t).into(),
                    relationship_type: RelationshipType::ConnectsTo,
                })
                .collect(),
        }
    }

    fn state_touching(asset: &str, phase: CrisisPhase) -> ScenarioState {
        let mut state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 10);
        state.commit(
            Inject::new(
                InjectId::sequential(1),
                TimeOffset::from_minutes(15),
                phase,
                "Phishing email opened on the finance workstation",
            )
            .with_asset(asset),
        );
        state
    }

    #[tokio::test]
    async fn playbook_ends_when_exhausted() {
        let planner = PlaybookPlanner::new();
        let view = StateView::default();
        let mut state = ScenarioState::new(ScenarioType::Ddos, ComplianceStandard::Dora, 10);

        let first = planner.plan(&view, &state).await;
        assert_eq!(
            first,
            PlanDecision::Continue {
                phase: CrisisPhase::SuspiciousActivity,
                objective: "Surface the first anomalies".into()
            }
        );

        for n in 0..GENERIC.len() {
            state.commit(Inject::new(
                InjectId::sequential(n + 1),
                TimeOffset::from_minutes(n as u32),
                CrisisPhase::Recovery,
                "x",
            ));
        }
        assert!(matches!(planner.plan(&view, &state).await, PlanDecision::End { .. }));
    }

    #[tokio::test]
    async fn opening_targets_healthy_workstations() {
        let view = StateView::new(vec![
            snap("SRV-01", "Server", EntityStatus::Online, &[]),
            snap("WS-01", "Workstation", EntityStatus::Online, &["SRV-01"]),
            snap("WS-02", "Workstation", EntityStatus::Offline, &[]),
        ]);
        let state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 10);

        let actions = GraphIntelPlanner::new()
            .gather(&view, &state, CrisisPhase::SuspiciousActivity)
            .await;
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].target, Some("WS-01".into()));
        assert_eq!(actions[0].status_effect, Some(EntityStatus::Suspicious));
        assert_eq!(actions[0].technique.as_deref(), Some("T1566"));
    }

    #[tokio::test]
    async fn later_actions_stay_causally_connected() {
        let view = StateView::new(vec![
            snap("DB-01", "Database", EntityStatus::Online, &[]),
            snap("SRV-01", "Server", EntityStatus::Online, &["DB-01"]),
            snap("WS-01", "Workstation", EntityStatus::Suspicious, &["SRV-01"]),
        ]);
        let state = state_touching("WS-01", CrisisPhase::SuspiciousActivity);

        let actions = GraphIntelPlanner::new()
            .gather(&view, &state, CrisisPhase::InitialIncident)
            .await;
        let targets: Vec<_> = actions.iter().filter_map(|a| a.target.clone()).collect();
        assert_eq!(targets, vec![EntityId::from("WS-01"), EntityId::from("SRV-01")]);
        assert!(!targets.contains(&"DB-01".into()));
    }

    #[tokio::test]
    async fn containment_isolates_and_recovery_restores() {
        let view = StateView::new(vec![snap("SRV-01", "Server", EntityStatus::Compromised, &[])]);
        let state = state_touching("SRV-01", CrisisPhase::InitialIncident);
        let planner = GraphIntelPlanner::new();

        let contain = planner.gather(&view, &state, CrisisPhase::Containment).await;
        assert_eq!(contain[0].status_effect, Some(EntityStatus::Offline));

        let recover = planner.gather(&view, &state, CrisisPhase::Recovery).await;
        assert_eq!(recover[0].status_effect, Some(EntityStatus::Online));
    }
}
