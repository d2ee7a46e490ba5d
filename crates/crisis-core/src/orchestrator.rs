//! Scenario workflow orchestrator
//!
//! Drives one scenario through the workflow table in [`crate::workflow`]:
//! - one inject in flight at a time, one run per scenario id
//! - every collaborator call bounded by the configured timeout
//! - graph updates and persistence only on commit
//!
//! Rejected drafts are refined with the critic's findings until the
//! refinement budget runs out; the action is then abandoned and another one
//! selected. The run ends when the iteration or abandonment budget is spent,
//! the manager planner ends it, or the caller cancels.

use crate::collaborators::{
    CandidateAction, Collaborators, DraftRequest, DraftResponse, PlanDecision, StateView,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::telemetry;
use crate::workflow::{validate_transition, WorkflowStep};
use crisis_critic::{Critic, Finding, Requirement};
use crisis_graph::{RunLease, StateStore};
use crisis_scenario::{
    CrisisPhase, Inject, ScenarioId, ScenarioRecord, ScenarioRepository, ScenarioState,
    ScenarioType, TimeOffset,
};
use dashmap::DashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Removes the scenario id from the running set when the run finishes
struct RunGuard {
    running: Arc<DashSet<ScenarioId>>,
    id: ScenarioId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.remove(&self.id);
    }
}

/// Scratch state of the inject currently being produced
#[derive(Default)]
struct Cycle {
    view: Arc<StateView>,
    phase: CrisisPhase,
    objective: String,
    candidates: Vec<CandidateAction>,
    excluded: Vec<CandidateAction>,
    action: Option<CandidateAction>,
    draft: Option<Inject>,
    feedback: Vec<Finding>,
    end_reason: Option<String>,
}

impl Cycle {
    fn end(&mut self, reason: impl Into<String>) -> WorkflowStep {
        self.end_reason = Some(reason.into());
        WorkflowStep::End
    }
}

/// Generates validated inject timelines
pub struct ScenarioOrchestrator {
    store: Arc<dyn StateStore>,
    critic: Arc<Critic>,
    collaborators: Collaborators,
    repository: Arc<dyn ScenarioRepository>,
    config: EngineConfig,
    running: Arc<DashSet<ScenarioId>>,
}

impl std::fmt::Debug for ScenarioOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioOrchestrator")
            .field("critic", &self.critic)
            .field("config", &self.config)
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

impl ScenarioOrchestrator {
    /// Create an orchestrator with a critic built from `config.critic`
    pub fn new(
        store: Arc<dyn StateStore>,
        collaborators: Collaborators,
        repository: Arc<dyn ScenarioRepository>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let critic = Arc::new(Critic::new(Arc::clone(&store), config.critic.clone()));
        Ok(Self {
            store,
            critic,
            collaborators,
            repository,
            config,
            running: Arc::new(DashSet::new()),
        })
    }

    /// Replace the critic, e.g. one with a semantic judge wired in
    #[must_use]
    pub fn with_critic(mut self, critic: Arc<Critic>) -> Self {
        self.critic = critic;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn critic(&self) -> &Arc<Critic> {
        &self.critic
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Whether a run for `id` is in progress
    #[must_use]
    pub fn is_running(&self, id: &ScenarioId) -> bool {
        self.running.contains(id)
    }

    /// Start a new scenario with the configured standard and budget and run it
    pub async fn generate(
        &self,
        scenario_type: ScenarioType,
        user: Option<String>,
    ) -> Result<ScenarioState, EngineError> {
        let mut state = ScenarioState::new(
            scenario_type,
            self.config.standard,
            self.config.max_iterations,
        );
        if let Some(user) = user {
            state = state.with_user(user);
        }
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run(state, cancel_rx).await
    }

    /// Run `state` to completion
    ///
    /// Returns the final state with accumulated errors and warnings. Fatal
    /// errors, cancellation and a concurrent run of the same scenario surface
    /// as `Err`; injects committed before that point stay persisted.
    #[instrument(
        skip_all,
        fields(
            scenario = %state.scenario_id,
            scenario_type = %state.scenario_type,
            standard = %state.standard
        )
    )]
    pub async fn run(
        &self,
        mut state: ScenarioState,
        cancel: watch::Receiver<bool>,
    ) -> Result<ScenarioState, EngineError> {
        let _guard = self.claim(state.scenario_id)?;
        let _lease: RunLease = self.store.begin_run()?;

        info!(max_iterations = state.max_iterations, "scenario run started");

        let mut cycle = Cycle::default();
        let mut step = WorkflowStep::StateCheck;

        while !step.is_terminal() {
            if *cancel.borrow() {
                warn!(committed = state.injects.len(), "scenario run cancelled");
                return Err(EngineError::Cancelled {
                    scenario_id: state.scenario_id,
                    committed: state.injects.len(),
                });
            }

            let next = match step {
                WorkflowStep::StateCheck => self.state_check(&state, &mut cycle)?,
                WorkflowStep::Plan => self.plan(&mut state, &mut cycle).await,
                WorkflowStep::Intel => self.intel(&mut state, &mut cycle).await,
                WorkflowStep::ActionSelect => self.select_action(&mut state, &mut cycle).await,
                WorkflowStep::Draft => self.draft(&mut state, &mut cycle).await,
                WorkflowStep::Validate => self.validate(&mut state, &mut cycle).await?,
                WorkflowStep::Commit => self.commit(&mut state, &mut cycle).await?,
                WorkflowStep::Refine => self.refine(&mut state, &mut cycle),
                WorkflowStep::End => break,
            };
            validate_transition(step, next)?;
            debug!(from = %step, to = %next, iteration = state.iteration, "workflow step");
            step = next;
        }

        self.persist(&state).await?;
        info!(
            injects = state.injects.len(),
            errors = state.errors.len(),
            warnings = state.warnings.len(),
            reason = cycle.end_reason.as_deref().unwrap_or("ended"),
            "scenario run finished"
        );
        Ok(state)
    }

    fn claim(&self, id: ScenarioId) -> Result<RunGuard, EngineError> {
        if !self.running.insert(id) {
            return Err(EngineError::ScenarioAlreadyRunning(id));
        }
        Ok(RunGuard {
            running: Arc::clone(&self.running),
            id,
        })
    }

    /// Bound a collaborator call by the configured timeout
    async fn call<T>(
        &self,
        collaborator: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, EngineError> {
        tokio::time::timeout(self.config.collaborator_timeout(), fut)
            .await
            .map_err(|_| {
                metrics::counter!(telemetry::COLLABORATOR_TIMEOUTS, "collaborator" => collaborator)
                    .increment(1);
                EngineError::Timeout {
                    collaborator,
                    timeout_ms: self.config.collaborator_timeout_ms,
                }
            })
    }

    async fn persist(&self, state: &ScenarioState) -> Result<(), EngineError> {
        self.repository
            .save(&ScenarioRecord::from_state(state))
            .await
            .map_err(EngineError::from)
    }

    fn state_check(
        &self,
        state: &ScenarioState,
        cycle: &mut Cycle,
    ) -> Result<WorkflowStep, EngineError> {
        if state.iterations_exhausted() {
            return Ok(cycle.end("iteration budget reached"));
        }
        let entities = self.store.get_current_state(None)?;
        *cycle = Cycle {
            view: Arc::new(StateView::new(entities)),
            ..Cycle::default()
        };
        Ok(WorkflowStep::Plan)
    }

    async fn plan(&self, state: &mut ScenarioState, cycle: &mut Cycle) -> WorkflowStep {
        let decision = self
            .call("manager planner", self.collaborators.manager.plan(&cycle.view, state))
            .await;

        match decision {
            Ok(PlanDecision::Continue { phase, objective }) => {
                cycle.phase = phase;
                cycle.objective = objective;
                WorkflowStep::Intel
            }
            Ok(PlanDecision::End { reason }) => {
                info!(%reason, "manager planner ended the scenario");
                cycle.end(reason)
            }
            Err(err) => {
                warn!(error = %err, "planning failed, continuing in current phase");
                state.record_warning(err.to_string());
                cycle.phase = state.current_phase;
                cycle.objective = "Continue developing the scenario".to_string();
                WorkflowStep::Intel
            }
        }
    }

    async fn intel(&self, state: &mut ScenarioState, cycle: &mut Cycle) -> WorkflowStep {
        let gathered = self
            .call(
                "intel planner",
                self.collaborators.intel.gather(&cycle.view, state, cycle.phase),
            )
            .await;

        cycle.candidates = gathered.unwrap_or_else(|err| {
            warn!(error = %err, "intel gathering failed");
            state.record_warning(err.to_string());
            Vec::new()
        });
        WorkflowStep::ActionSelect
    }

    async fn select_action(&self, state: &mut ScenarioState, cycle: &mut Cycle) -> WorkflowStep {
        if state.abandoned_actions >= self.config.max_abandoned_actions {
            let message = format!(
                "scenario ended after {} abandoned actions",
                state.abandoned_actions
            );
            warn!("{message}");
            state.record_warning(message.clone());
            return cycle.end(message);
        }

        let open: Vec<CandidateAction> = cycle
            .candidates
            .iter()
            .filter(|c| !cycle.excluded.contains(c))
            .cloned()
            .collect();

        let chosen = if open.is_empty() {
            None
        } else {
            match self
                .call("action selector", self.collaborators.selector.select(&open, state))
                .await
            {
                Ok(chosen) => chosen,
                Err(err) => {
                    warn!(error = %err, "action selection failed");
                    state.record_warning(err.to_string());
                    None
                }
            }
        };

        let action = chosen.unwrap_or_else(|| {
            debug!(phase = %cycle.phase, "no candidate action, using narrative fallback");
            CandidateAction::fallback(cycle.phase)
        });
        debug!(action = %action, "action selected");

        cycle.action = Some(action);
        cycle.feedback.clear();
        state.refine_count = 0;
        WorkflowStep::Draft
    }

    fn draft_request(&self, state: &ScenarioState, cycle: &Cycle, action: CandidateAction) -> DraftRequest {
        let requirements: Vec<Requirement> = self
            .critic
            .framework(state.standard)
            .map(|f| {
                f.load_requirements()
                    .into_iter()
                    .filter(|r| r.mandatory && r.applies_to(cycle.phase))
                    .collect()
            })
            .unwrap_or_default();

        DraftRequest {
            inject_id: state.next_inject_id(),
            phase: cycle.phase,
            objective: cycle.objective.clone(),
            action,
            not_before: state.last_offset().unwrap_or(TimeOffset::ZERO),
            standard: state.standard,
            requirements,
            view: Arc::clone(&cycle.view),
            prior_injects: state.injects.clone(),
            feedback: cycle.feedback.clone(),
            attempt: state.refine_count,
        }
    }

    async fn draft(&self, state: &mut ScenarioState, cycle: &mut Cycle) -> WorkflowStep {
        let action = cycle
            .action
            .clone()
            .unwrap_or_else(|| CandidateAction::fallback(cycle.phase));
        let request = self.draft_request(state, cycle, action);

        let response = self
            .call("content producer", self.collaborators.producer.draft(&request))
            .await;

        match response {
            Ok(DraftResponse::Draft(inject)) => {
                cycle.draft = Some(inject);
                WorkflowStep::Validate
            }
            Ok(DraftResponse::Malformed { raw }) => {
                let err = EngineError::MalformedCollaboratorResponse {
                    collaborator: "content producer",
                    raw,
                };
                warn!(error = %err, "discarding malformed draft");
                state.record_warning(err.to_string());
                cycle.draft = None;
                WorkflowStep::Refine
            }
            Err(err) => {
                warn!(error = %err, "draft not produced");
                state.record_error(format!("{}: {err}", request.inject_id));
                cycle.draft = None;
                WorkflowStep::Refine
            }
        }
    }

    async fn validate(
        &self,
        state: &mut ScenarioState,
        cycle: &mut Cycle,
    ) -> Result<WorkflowStep, EngineError> {
        let Some(draft) = cycle.draft.as_ref() else {
            return Ok(WorkflowStep::Refine);
        };
        let verdict = self.critic.validate(draft, state).await?;

        if verdict.accepted {
            for finding in &verdict.warnings {
                state.record_warning(format!("{}: {finding}", draft.inject_id));
            }
            return Ok(WorkflowStep::Commit);
        }

        for finding in &verdict.errors {
            metrics::counter!(telemetry::DRAFTS_REJECTED, "check" => finding.check.to_string())
                .increment(1);
        }
        let rejection = EngineError::ValidationRejection {
            inject_id: draft.inject_id.clone(),
            reasons: verdict.error_messages(),
        };
        debug!(error = %rejection, "draft rejected");
        state.record_error(rejection.to_string());

        cycle.feedback = verdict.errors;
        cycle.draft = None;
        Ok(WorkflowStep::Refine)
    }

    async fn commit(
        &self,
        state: &mut ScenarioState,
        cycle: &mut Cycle,
    ) -> Result<WorkflowStep, EngineError> {
        let Some(inject) = cycle.draft.take() else {
            return Err(EngineError::NotFound("accepted draft".to_string()));
        };

        let changes = inject.status_changes();
        for (id, status) in changes.iter().filter(|(_, s)| s.indicates_adversary()) {
            // advisory only; never blocks the commit
            if let Ok(report) =
                self.store
                    .calculate_cascading_impact(id, status, self.config.impact_depth)
            {
                debug!(
                    asset = %id,
                    status = %status,
                    affected = report.affected_count(),
                    severity = %report.impact_severity,
                    "cascading impact"
                );
            }
        }
        if !changes.is_empty() {
            self.store
                .apply_status_batch(&changes, Some(inject.inject_id.as_str()))?;
        }

        info!(
            inject = %inject.inject_id,
            offset = %inject.time_offset,
            phase = %inject.phase,
            assets = inject.affected_assets().len(),
            "inject committed"
        );
        state.commit(inject);
        metrics::counter!(telemetry::INJECTS_ACCEPTED).increment(1);

        self.persist(state).await?;
        Ok(WorkflowStep::StateCheck)
    }

    fn refine(&self, state: &mut ScenarioState, cycle: &mut Cycle) -> WorkflowStep {
        state.refine_count += 1;
        if state.refine_count <= self.config.max_refinements {
            return WorkflowStep::Draft;
        }

        let action = cycle
            .action
            .take()
            .unwrap_or_else(|| CandidateAction::fallback(cycle.phase));
        let err = EngineError::RetryBudgetExceeded {
            action: action.to_string(),
            attempts: state.refine_count,
        };
        warn!(error = %err, "abandoning action");
        state.record_warning(err.to_string());
        metrics::counter!(telemetry::ACTIONS_ABANDONED).increment(1);

        state.abandoned_actions += 1;
        state.refine_count = 0;
        cycle.excluded.push(action);
        cycle.feedback.clear();
        WorkflowStep::ActionSelect
    }
}
