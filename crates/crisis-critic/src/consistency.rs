//! State-consistency checks
//!
//! Amnesia: content announcing the *initial* compromise of an asset that an
//! earlier accepted inject already compromised.
//!
//! Regression: a status effect walking a compromised or encrypted asset back
//! before containment has started. Once this timeline has compromised an
//! asset, every later effect outside containment or recovery must keep it
//! compromise-class, so a compromise cannot be undone through an intermediate
//! status either.

use crate::verdict::{CheckKind, Finding};
use crisis_graph::{GraphError, StateStore};
use crisis_scenario::{Inject, ScenarioState};
use once_cell::sync::Lazy;
use regex::Regex;

static INITIAL_COMPROMISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(initial(ly)?|first|new(ly)?)\s+(signs?\s+of\s+)?(compromis\w*|breach\w*|intrusion|infection|infected|foothold|access)\b|\bpatient zero\b|\bhas (just )?been (compromised|breached)\b",
    )
    .expect("invalid initial-compromise pattern")
});

/// Whether `content` names `id` as a whole token
///
/// `DB-01` matches "DB-01." and "(db-01)" but not "DB-010".
#[must_use]
pub fn mentions_asset(content: &str, id: &str) -> bool {
    content
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .any(|token| token.eq_ignore_ascii_case(id))
}

/// Whether `content` announces a first compromise
#[must_use]
pub fn claims_initial_compromise(content: &str) -> bool {
    INITIAL_COMPROMISE.is_match(content)
}

/// Detect re-announced compromises
///
/// An asset counts when it is listed as affected or named in the content.
#[must_use]
pub fn check_amnesia(draft: &Inject, state: &ScenarioState) -> Vec<Finding> {
    if !claims_initial_compromise(&draft.content) {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for asset in state.affected_assets() {
        let mentioned = draft.affected_assets().contains(&asset)
            || mentions_asset(&draft.content, asset.as_str());
        if !mentioned {
            continue;
        }
        if let Some(earlier) = state.compromised_by(&asset, draft.time_offset) {
            findings.push(
                Finding::error(
                    CheckKind::StateConsistency,
                    "amnesia",
                    format!(
                        "{asset} was already compromised by {} at {}; content claims an initial compromise",
                        earlier.inject_id, earlier.time_offset
                    ),
                )
                .with_asset(asset.clone())
                .with_remediation(format!(
                    "describe continued attacker activity on {asset} instead of a new compromise"
                )),
            );
        }
    }
    findings
}

/// Detect status effects reverting a compromise outside containment/recovery
pub fn check_regression(
    draft: &Inject,
    state: &ScenarioState,
    store: &dyn StateStore,
) -> Result<Vec<Finding>, GraphError> {
    if draft.phase.permits_restoration() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for (id, status) in &draft.technical_metadata.status_effects {
        if status.is_compromise_class() || !store.contains_entity(id)? {
            continue;
        }

        let message = if let Some(earlier) = state.injects.iter().find(|i| i.compromises(id)) {
            format!(
                "{id} was compromised by {} and would move to {status} during {}",
                earlier.inject_id, draft.phase
            )
        } else {
            let current = store.get_entity_status(id)?;
            if !(status.is_healthy() && current.is_compromise_class()) {
                continue;
            }
            format!("{id} would return from {current} to {status} during {}", draft.phase)
        };

        findings.push(
            Finding::error(CheckKind::StateConsistency, "status_regression", message)
                .with_asset(id.clone())
                .with_remediation("restore compromised assets only in a containment or recovery inject"),
        );
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_initial_compromise_claims() {
        for text in [
            "Initial compromise of DB-01 detected by EDR",
            "First signs of intrusion on the core database",
            "DB-01 has been compromised according to the SOC",
            "Analysts identify patient zero on the finance floor",
        ] {
            assert!(claims_initial_compromise(text), "{text}");
        }
    }

    #[test]
    fn asset_mentions_match_whole_ids() {
        assert!(mentions_asset("Initial compromise of DB-01.", "DB-01"));
        assert!(mentions_asset("host (db-01) beacons", "DB-01"));
        assert!(!mentions_asset("initial compromise of their host DB-010", "DB-01"));
        assert!(!mentions_asset("XDB-01 rebooted", "DB-01"));
        assert!(!mentions_asset("DB-01_backup restored", "DB-01"));
    }

    #[test]
    fn ignores_continued_activity() {
        for text in [
            "Attacker continues lateral movement from DB-01",
            "Encryption spreads across the file shares",
            "Initial triage of the alert queue begins",
        ] {
            assert!(!claims_initial_compromise(text), "{text}");
        }
    }
}
