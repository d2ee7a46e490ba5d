//! Structural checks
//!
//! Content length, referential integrity, timeline ordering and id
//! uniqueness. These run first and do not depend on any other check.

use crate::verdict::{CheckKind, Finding};
use crisis_graph::{GraphError, StateStore};
use crisis_scenario::{Inject, ScenarioState};

/// Check `draft` against the timeline in `state` and the entities in `store`
pub fn check_structure(
    draft: &Inject,
    state: &ScenarioState,
    store: &dyn StateStore,
    min_content_length: usize,
) -> Result<Vec<Finding>, GraphError> {
    let mut findings = Vec::new();
    let error = |code: &str, message: String| Finding::error(CheckKind::Structure, code, message);

    let length = draft.content.trim().chars().count();
    if length < min_content_length {
        findings.push(
            error(
                "content_too_short",
                format!("content has {length} characters, minimum is {min_content_length}"),
            )
            .with_remediation("expand the inject narrative with who observed what, where"),
        );
    }

    for asset in draft.affected_assets() {
        if !store.contains_entity(asset)? {
            findings.push(
                error("unknown_asset", format!("affected asset {asset} does not exist"))
                    .with_asset(asset.clone())
                    .with_remediation("reference only entities present in the infrastructure"),
            );
        }
    }

    for target in draft.technical_metadata.status_effects.keys() {
        if !draft.affected_assets().contains(target) {
            findings.push(
                error(
                    "effect_not_affected",
                    format!("status effect on {target} which is not listed as affected"),
                )
                .with_asset(target.clone())
                .with_remediation(format!("add {target} to affected_assets")),
            );
        }
    }

    if let Some(last) = state.last_offset() {
        if draft.time_offset < last {
            findings.push(
                error(
                    "time_regression",
                    format!(
                        "time offset {} precedes the last accepted inject at {last}",
                        draft.time_offset
                    ),
                )
                .with_remediation(format!("schedule the inject at or after {last}")),
            );
        }
    }

    if draft.phase < state.current_phase {
        findings.push(
            error(
                "phase_regression",
                format!(
                    "phase {} is earlier than the scenario phase {}",
                    draft.phase, state.current_phase
                ),
            )
            .with_remediation(format!("use phase {} or later", state.current_phase)),
        );
    }

    if state.contains_inject(&draft.inject_id) {
        findings.push(
            error(
                "duplicate_inject_id",
                format!("inject id {} is already in the timeline", draft.inject_id),
            )
            .with_remediation(format!("use {}", state.next_inject_id())),
        );
    }

    Ok(findings)
}
