//! Reference action selector

use super::{ActionSelector, CandidateAction};
use async_trait::async_trait;
use crisis_scenario::ScenarioState;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks the most critical target, breaking ties with a seeded RNG
///
/// The same seed and the same candidate sequence yield the same choices.
#[derive(Debug)]
pub struct CriticalityActionSelector {
    rng: Mutex<StdRng>,
}

impl CriticalityActionSelector {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl ActionSelector for CriticalityActionSelector {
    async fn select(
        &self,
        candidates: &[CandidateAction],
        _state: &ScenarioState,
    ) -> Option<CandidateAction> {
        let top = candidates.iter().map(|c| c.criticality).max()?;
        let best: Vec<&CandidateAction> =
            candidates.iter().filter(|c| c.criticality == top).collect();
        let idx = self.rng.lock().gen_range(0..best.len());
        Some(best[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crisis_graph::Criticality;
    use crisis_scenario::{ComplianceStandard, ScenarioType};

    fn candidates() -> Vec<CandidateAction> {
        vec![
            CandidateAction::new("a").with_target("WS-01".into(), Criticality::Standard),
            CandidateAction::new("b").with_target("DB-01".into(), Criticality::Critical),
            CandidateAction::new("c").with_target("APP-01".into(), Criticality::Critical),
        ]
    }

    #[tokio::test]
    async fn prefers_critical_targets() {
        let selector = CriticalityActionSelector::new(7);
        let state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 5);
        for _ in 0..10 {
            let chosen = selector.select(&candidates(), &state).await.unwrap();
            assert_eq!(chosen.criticality, Criticality::Critical);
        }
        assert!(selector.select(&[], &state).await.is_none());
    }

    #[tokio::test]
    async fn same_seed_same_choices() {
        let state = ScenarioState::new(ScenarioType::Ransomware, ComplianceStandard::Dora, 5);
        let (a, b) = (CriticalityActionSelector::new(42), CriticalityActionSelector::new(42));
        for _ in 0..8 {
            assert_eq!(
                a.select(&candidates(), &state).await,
                b.select(&candidates(), &state).await
            );
        }
    }
}
