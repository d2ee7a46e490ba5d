//! Acceptance gate for drafted injects
//!
//! Runs every check independently and collects all findings, so one verdict
//! tells the producer everything a revised draft must fix.

use crate::cache::{ComplianceCache, DEFAULT_CACHE_CAPACITY};
use crate::causality::check_causality;
use crate::consistency::{check_amnesia, check_regression};
use crate::error::CriticError;
use crate::framework::{CatalogFramework, ComplianceFramework};
use crate::structure::check_structure;
use crate::tags::check_tags;
use crate::verdict::{CheckKind, CriticVerdict, Finding, Severity, VerdictDetails};
use crisis_graph::StateStore;
use crisis_scenario::{ComplianceStandard, Inject, ScenarioState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default minimum inject content length in characters
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 40;

/// Critic tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticConfig {
    pub min_content_length: usize,
    /// Opening inject may declare where the attacker starts
    pub allow_initial_foothold: bool,
    /// Ungrounded compliance tags reject instead of warn
    pub strict_tag_grounding: bool,
    pub cache_capacity: u64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            allow_initial_foothold: true,
            strict_tag_grounding: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CriticConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_min_content_length(mut self, length: usize) -> Self {
        self.min_content_length = length;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_initial_foothold(mut self, allow: bool) -> Self {
        self.allow_initial_foothold = allow;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_strict_tag_grounding(mut self, strict: bool) -> Self {
        self.strict_tag_grounding = strict;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// Causal and compliance critic
pub struct Critic {
    store: Arc<dyn StateStore>,
    frameworks: HashMap<ComplianceStandard, Arc<dyn ComplianceFramework>>,
    cache: ComplianceCache,
    config: CriticConfig,
}

impl std::fmt::Debug for Critic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut standards: Vec<_> = self.frameworks.keys().collect();
        standards.sort();
        f.debug_struct("Critic")
            .field("frameworks", &standards)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Critic {
    /// Create a critic with the built-in catalogs for every standard
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, config: CriticConfig) -> Self {
        let critic = Self {
            store,
            frameworks: HashMap::new(),
            cache: ComplianceCache::new(config.cache_capacity),
            config,
        };
        ComplianceStandard::ALL.into_iter().fold(critic, |c, standard| {
            c.with_framework(Arc::new(CatalogFramework::builtin(standard)))
        })
    }

    /// Register or replace the framework for its standard
    #[must_use]
    pub fn with_framework(mut self, framework: Arc<dyn ComplianceFramework>) -> Self {
        self.frameworks.insert(framework.standard(), framework);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    /// Framework registered for `standard`
    #[must_use]
    pub fn framework(&self, standard: ComplianceStandard) -> Option<Arc<dyn ComplianceFramework>> {
        self.frameworks.get(&standard).cloned()
    }

    /// Forget cached compliance judgements
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
        tracing::debug!("compliance cache invalidated");
    }

    /// Validate `draft` against the timeline in `state`
    ///
    /// A rejection is an `Ok` verdict with at least one error finding. `Err`
    /// means no verdict could be produced.
    pub async fn validate(
        &self,
        draft: &Inject,
        state: &ScenarioState,
    ) -> Result<CriticVerdict, CriticError> {
        let framework = self
            .framework(state.standard)
            .ok_or(CriticError::UnsupportedStandard(state.standard))?;
        let store = self.store.as_ref();

        let mut findings =
            check_structure(draft, state, store, self.config.min_content_length)?;

        let causality = check_causality(draft, state, store, self.config.allow_initial_foothold)?;
        findings.extend(causality.findings);

        findings.extend(check_amnesia(draft, state));
        findings.extend(check_regression(draft, state, store)?);

        let tag_severity = if self.config.strict_tag_grounding {
            Severity::Error
        } else {
            Severity::Warning
        };
        findings.extend(check_tags(draft, tag_severity));

        let context = Some(state.scenario_type.as_str());
        let key = ComplianceCache::key(
            state.standard,
            draft.phase,
            &draft.content,
            &draft.technical_metadata,
            context,
        );
        let (judgement, cached) = match self.cache.get(&key).await {
            Some(hit) => (hit, true),
            None => {
                let judged = framework
                    .validate(&draft.content, draft.phase, &draft.technical_metadata, context)
                    .await;
                // fallback judgements are not cached so the judge is retried next time
                if !judged.is_fallback() {
                    self.cache.insert(key, judged.clone()).await;
                }
                (judged, false)
            }
        };

        let catalog = framework.load_requirements();
        for id in &judgement.missing {
            let requirement = catalog.iter().find(|r| &r.id == id);
            let mandatory = requirement.map_or(true, |r| r.mandatory);
            let name = requirement.map_or(id.as_str(), |r| r.name.as_str());

            let finding = if mandatory {
                Finding::error(
                    CheckKind::MandatoryRequirement,
                    "missing_requirement",
                    format!("mandatory {} requirement {id} ({name}) is not addressed", state.standard),
                )
            } else {
                Finding::warning(
                    CheckKind::MandatoryRequirement,
                    "optional_requirement_missing",
                    format!("{} requirement {id} ({name}) is not addressed", state.standard),
                )
            };
            findings.push(match requirement {
                Some(r) => finding.with_remediation(r.criteria.clone()),
                None => finding,
            });
        }
        for warning in &judgement.warnings {
            findings.push(Finding::warning(
                CheckKind::MandatoryRequirement,
                "judge_fallback",
                warning.clone(),
            ));
        }

        let details = VerdictDetails {
            precedents: causality.precedents,
            compliance: Some(judgement),
            compliance_cached: cached,
        };
        let verdict = CriticVerdict::from_findings(findings, details);

        tracing::debug!(
            inject = %draft.inject_id,
            accepted = verdict.accepted,
            errors = verdict.errors.len(),
            warnings = verdict.warnings.len(),
            cached,
            "draft validated"
        );
        Ok(verdict)
    }
}
