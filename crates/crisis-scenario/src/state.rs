//! Scenario run state
//!
//! [`ScenarioState`] is owned by one generation run. The critic reads it,
//! only the orchestrator writes it.

use crate::inject::Inject;
use crate::types::{ComplianceStandard, CrisisPhase, InjectId, ScenarioId, ScenarioType, TimeOffset};
use chrono::{DateTime, Utc};
use crisis_graph::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregate state of one scenario generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub scenario_id: ScenarioId,
    pub scenario_type: ScenarioType,
    pub standard: ComplianceStandard,
    #[serde(default)]
    pub user: Option<String>,
    pub current_phase: CrisisPhase,
    /// Accepted injects in commit order
    pub injects: Vec<Inject>,
    pub iteration: u32,
    /// Rejections of the inject currently in flight
    pub refine_count: u32,
    pub max_iterations: u32,
    pub abandoned_actions: u32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ScenarioState {
    /// Fresh state for a new run
    #[must_use]
    pub fn new(scenario_type: ScenarioType, standard: ComplianceStandard, max_iterations: u32) -> Self {
        Self {
            scenario_id: ScenarioId::new(),
            scenario_type,
            standard,
            user: None,
            current_phase: CrisisPhase::default(),
            injects: Vec::new(),
            iteration: 0,
            refine_count: 0,
            max_iterations,
            abandoned_actions: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// With a fixed scenario id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: ScenarioId) -> Self {
        self.scenario_id = id;
        self
    }

    /// With the requesting user
    #[inline]
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Whether no inject has been accepted yet
    #[inline]
    #[must_use]
    pub fn is_opening(&self) -> bool {
        self.injects.is_empty()
    }

    /// Whether the iteration budget is spent
    #[inline]
    #[must_use]
    pub fn iterations_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// Offset of the last accepted inject
    #[must_use]
    pub fn last_offset(&self) -> Option<TimeOffset> {
        self.injects.last().map(|i| i.time_offset)
    }

    /// Id for the next inject of this timeline
    #[must_use]
    pub fn next_inject_id(&self) -> InjectId {
        InjectId::sequential(self.injects.len() + 1)
    }

    /// Whether an accepted inject already uses `id`
    #[must_use]
    pub fn contains_inject(&self, id: &InjectId) -> bool {
        self.injects.iter().any(|i| &i.inject_id == id)
    }

    /// Assets touched by any accepted inject
    #[must_use]
    pub fn affected_assets(&self) -> BTreeSet<EntityId> {
        self.injects
            .iter()
            .flat_map(|i| i.affected_assets().iter().cloned())
            .collect()
    }

    /// Earliest accepted inject at or before `at` that compromised `id`
    #[must_use]
    pub fn compromised_by(&self, id: &EntityId, at: TimeOffset) -> Option<&Inject> {
        self.injects
            .iter()
            .find(|i| i.time_offset <= at && i.compromises(id))
    }

    /// Record an accepted inject
    ///
    /// Appends to the timeline, resets the refine counter, advances the
    /// iteration and moves the phase forward when the inject is later.
    pub fn commit(&mut self, inject: Inject) {
        self.current_phase = self.current_phase.max(inject.phase);
        self.injects.push(inject);
        self.refine_count = 0;
        self.iteration += 1;
    }

    /// Record a run-level error
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record a run-level warning
    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crisis_graph::EntityStatus;

    fn state() -> ScenarioState {
        ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 5)
    }

    #[test]
    fn commit_advances_bookkeeping() {
        let mut s = state();
        s.refine_count = 2;
        assert!(s.is_opening());
        assert_eq!(s.next_inject_id(), InjectId::from("INJ-001"));

        s.commit(
            Inject::new("INJ-001", TimeOffset::from_hm(1, 0), CrisisPhase::InitialIncident, "x")
                .with_asset("WS-FIN-01"),
        );

        assert_eq!(s.iteration, 1);
        assert_eq!(s.refine_count, 0);
        assert_eq!(s.current_phase, CrisisPhase::InitialIncident);
        assert_eq!(s.last_offset(), Some(TimeOffset::from_hm(1, 0)));
        assert!(s.affected_assets().contains(&EntityId::from("WS-FIN-01")));
        assert!(s.contains_inject(&"INJ-001".into()));
    }

    #[test]
    fn phase_never_moves_backwards_on_commit() {
        let mut s = state();
        s.commit(Inject::new("INJ-001", TimeOffset::ZERO, CrisisPhase::Containment, "x"));
        s.commit(Inject::new("INJ-002", TimeOffset::ZERO, CrisisPhase::InitialIncident, "x"));
        assert_eq!(s.current_phase, CrisisPhase::Containment);
    }

    #[test]
    fn compromise_lookup_respects_offsets() {
        let mut s = state();
        s.commit(
            Inject::new("INJ-001", TimeOffset::from_hm(1, 0), CrisisPhase::InitialIncident, "x")
                .with_effect("DB-01", EntityStatus::Compromised),
        );

        let db = EntityId::from("DB-01");
        assert!(s.compromised_by(&db, TimeOffset::from_hm(2, 0)).is_some());
        assert!(s.compromised_by(&db, TimeOffset::from_hm(0, 30)).is_none());
        assert!(s.compromised_by(&"DB-02".into(), TimeOffset::from_hm(2, 0)).is_none());
    }

    #[test]
    fn zero_budget_is_exhausted_immediately() {
        let s = ScenarioState::new(ScenarioType::DataBreach, ComplianceStandard::NistCsf, 0);
        assert!(s.iterations_exhausted());
    }
}
