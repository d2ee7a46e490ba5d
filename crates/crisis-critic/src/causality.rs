//! Teleportation check
//!
//! An attacker cannot act on an asset out of nowhere. Every affected asset
//! needs a precedent in this scenario's own timeline: an earlier accepted
//! inject touched it, or a causal edge reaches it from an asset that an
//! earlier inject touched. Store status alone never counts, since the store
//! is shared with other runs.
//!
//! The opening inject may declare a single foothold. Any further asset it
//! names must be reachable over a causal edge from an asset already admitted
//! in the same draft.

use crate::verdict::{CheckKind, Finding, Precedent};
use crisis_graph::{EntityId, GraphError, StateStore};
use crisis_scenario::{Inject, ScenarioState};
use std::collections::{BTreeMap, BTreeSet};

/// Causality findings plus the precedent found for each admitted asset
#[derive(Debug, Default)]
pub struct CausalityOutcome {
    pub findings: Vec<Finding>,
    pub precedents: BTreeMap<EntityId, Precedent>,
}

/// Find a precedent for every affected asset of `draft`
///
/// Assets missing from the store are skipped; the structure check reports
/// them.
pub fn check_causality(
    draft: &Inject,
    state: &ScenarioState,
    store: &dyn StateStore,
    allow_initial_foothold: bool,
) -> Result<CausalityOutcome, GraphError> {
    let mut outcome = CausalityOutcome::default();
    let prior = state.affected_assets();
    let opening = allow_initial_foothold && state.is_opening();

    for asset in draft.affected_assets() {
        if !store.contains_entity(asset)? {
            continue;
        }

        let precedent = if prior.contains(asset) {
            Some(Precedent::PriorInject)
        } else if opening && outcome.precedents.is_empty() {
            Some(Precedent::InitialFoothold)
        } else {
            // the opening draft may chain from its own foothold
            let admitted: BTreeSet<&EntityId> = if opening {
                outcome.precedents.keys().collect()
            } else {
                BTreeSet::new()
            };
            store
                .causal_predecessors(asset)?
                .into_iter()
                .find(|pred| prior.contains(pred) || admitted.contains(pred))
                .map(Precedent::CausalEdgeFrom)
        };

        match precedent {
            Some(p) => {
                outcome.precedents.insert(asset.clone(), p);
            }
            None => {
                let preds = store.causal_predecessors(asset)?;
                let remediation = if preds.is_empty() {
                    format!("{asset} has no incoming causal edge; only an earlier inject can establish it")
                } else {
                    let names: Vec<_> = preds.iter().map(EntityId::as_str).collect();
                    format!("first compromise one of {} which reach {asset}", names.join(", "))
                };
                tracing::debug!(asset = %asset, inject = %draft.inject_id, "teleportation rejected");
                outcome.findings.push(
                    Finding::error(
                        CheckKind::Causality,
                        "teleportation",
                        format!("{asset} is affected without causal precedent"),
                    )
                    .with_asset(asset.clone())
                    .with_remediation(remediation),
                );
            }
        }
    }

    Ok(outcome)
}
