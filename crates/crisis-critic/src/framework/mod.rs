//! Compliance frameworks
//!
//! A framework owns the requirement catalog of one regulatory standard and
//! judges inject content against it. An optional [`SemanticJudge`] may do the
//! judging; whenever it is missing, unavailable, slow or returns garbage the
//! deterministic keyword heuristic answers instead, so validation never blocks
//! on an external judge.

pub mod dora;
pub mod iso27001;
pub mod nist;

use crate::tags::TagCategory;
use async_trait::async_trait;
use crisis_scenario::{ComplianceStandard, CrisisPhase, TechnicalMetadata};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a semantic judge call
pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(10);

/// One requirement of a standard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub id: String,
    pub name: String,
    pub category: TagCategory,
    pub mandatory: bool,
    /// Phases the requirement applies to; empty means every phase
    pub phases: Vec<CrisisPhase>,
    /// What an inject must state to satisfy the requirement
    pub criteria: String,
    /// Lowercase evidence terms used by the heuristic judge
    pub keywords: Vec<String>,
}

impl Requirement {
    /// Create an optional requirement applying to every phase
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: TagCategory,
        criteria: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            mandatory: false,
            phases: Vec::new(),
            criteria: criteria.into(),
            keywords: Vec::new(),
        }
    }

    /// Mark mandatory
    #[inline]
    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Restrict to `phases`
    #[must_use]
    pub fn in_phases(mut self, phases: &[CrisisPhase]) -> Self {
        self.phases = phases.to_vec();
        self
    }

    /// With heuristic evidence terms
    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_ascii_lowercase()).collect();
        self
    }

    /// Whether the requirement is in force during `phase`
    #[must_use]
    pub fn applies_to(&self, phase: CrisisPhase) -> bool {
        self.phases.is_empty() || self.phases.contains(&phase)
    }

    /// Keyword evidence of the requirement in `content`
    #[must_use]
    pub fn evidenced_by(&self, content: &str) -> bool {
        let lowered = content.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Who produced a judgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgementSource {
    Heuristic,
    Semantic,
    /// Heuristic answer standing in for a judge that failed
    Fallback,
}

/// Compliance verdict for one piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceJudgement {
    /// No applicable mandatory requirement is missing
    pub compliant: bool,
    pub met: Vec<String>,
    pub missing: Vec<String>,
    pub warnings: Vec<String>,
    pub source: JudgementSource,
}

impl ComplianceJudgement {
    /// Whether a failed semantic judge was replaced by the heuristic
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == JudgementSource::Fallback
    }
}

/// Output of a semantic judge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeResponse {
    /// Requirement ids judged met and missing
    Judged { met: Vec<String>, missing: Vec<String> },
    /// Output that could not be interpreted
    Malformed { raw: String },
    /// Judge could not be reached
    Unavailable { reason: String },
}

/// External, typically model-based, requirement judge
#[async_trait]
pub trait SemanticJudge: Send + Sync {
    /// Judge `content` against `requirements`
    async fn judge(
        &self,
        standard: ComplianceStandard,
        requirements: &[Requirement],
        content: &str,
        metadata: &TechnicalMetadata,
        context: Option<&str>,
    ) -> JudgeResponse;
}

/// Requirement catalog and judge for one standard
#[async_trait]
pub trait ComplianceFramework: Send + Sync {
    /// Standard this framework covers
    fn standard(&self) -> ComplianceStandard;

    /// Full requirement catalog
    fn load_requirements(&self) -> Vec<Requirement>;

    /// Judge `content` against the requirements applicable to `phase`
    async fn validate(
        &self,
        content: &str,
        phase: CrisisPhase,
        metadata: &TechnicalMetadata,
        context: Option<&str>,
    ) -> ComplianceJudgement;
}

/// Catalog-backed framework with optional semantic judge
#[derive(Clone)]
pub struct CatalogFramework {
    standard: ComplianceStandard,
    requirements: Vec<Requirement>,
    judge: Option<Arc<dyn SemanticJudge>>,
    judge_timeout: Duration,
}

impl std::fmt::Debug for CatalogFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFramework")
            .field("standard", &self.standard)
            .field("requirements", &self.requirements.len())
            .field("judge", &self.judge.is_some())
            .field("judge_timeout", &self.judge_timeout)
            .finish()
    }
}

impl CatalogFramework {
    /// Create heuristic-only framework
    #[must_use]
    pub fn new(standard: ComplianceStandard, requirements: Vec<Requirement>) -> Self {
        Self {
            standard,
            requirements,
            judge: None,
            judge_timeout: DEFAULT_JUDGE_TIMEOUT,
        }
    }

    /// Built-in catalog for `standard`
    #[must_use]
    pub fn builtin(standard: ComplianceStandard) -> Self {
        let requirements = match standard {
            ComplianceStandard::Dora => dora::requirements(),
            ComplianceStandard::NistCsf => nist::requirements(),
            ComplianceStandard::Iso27001 => iso27001::requirements(),
        };
        Self::new(standard, requirements)
    }

    /// With a semantic judge consulted before the heuristic
    #[inline]
    #[must_use]
    pub fn with_judge(mut self, judge: Arc<dyn SemanticJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// With bound on judge calls
    #[inline]
    #[must_use]
    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = timeout;
        self
    }

    fn applicable(&self, phase: CrisisPhase) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| r.applies_to(phase))
            .collect()
    }

    /// Assemble a judgement; applicable ids not judged met count as missing
    fn judgement(
        applicable: &[&Requirement],
        met: &HashSet<String>,
        warnings: Vec<String>,
        source: JudgementSource,
    ) -> ComplianceJudgement {
        let (met_reqs, missing_reqs): (Vec<&&Requirement>, Vec<&&Requirement>) =
            applicable.iter().partition(|r| met.contains(&r.id));

        ComplianceJudgement {
            compliant: missing_reqs.iter().all(|r| !r.mandatory),
            met: met_reqs.iter().map(|r| r.id.clone()).collect(),
            missing: missing_reqs.iter().map(|r| r.id.clone()).collect(),
            warnings,
            source,
        }
    }
}

/// Keyword heuristic: a requirement is met when any of its keywords occurs
#[must_use]
pub fn heuristic_met(requirements: &[&Requirement], content: &str) -> HashSet<String> {
    requirements
        .iter()
        .filter(|r| r.evidenced_by(content))
        .map(|r| r.id.clone())
        .collect()
}

#[async_trait]
impl ComplianceFramework for CatalogFramework {
    fn standard(&self) -> ComplianceStandard {
        self.standard
    }

    fn load_requirements(&self) -> Vec<Requirement> {
        self.requirements.clone()
    }

    async fn validate(
        &self,
        content: &str,
        phase: CrisisPhase,
        metadata: &TechnicalMetadata,
        context: Option<&str>,
    ) -> ComplianceJudgement {
        let applicable = self.applicable(phase);
        let mut warnings = Vec::new();

        if let Some(judge) = &self.judge {
            let owned: Vec<Requirement> = applicable.iter().map(|r| (*r).clone()).collect();
            let call = judge.judge(self.standard, &owned, content, metadata, context);

            match tokio::time::timeout(self.judge_timeout, call).await {
                Ok(JudgeResponse::Judged { met, .. }) => {
                    let met: HashSet<String> = met.into_iter().collect();
                    return Self::judgement(&applicable, &met, warnings, JudgementSource::Semantic);
                }
                Ok(JudgeResponse::Malformed { raw }) => {
                    tracing::warn!(
                        standard = %self.standard,
                        bytes = raw.len(),
                        "semantic judge returned malformed output, using heuristic"
                    );
                    warnings.push(format!(
                        "semantic judge output unparseable ({} bytes); heuristic fallback used",
                        raw.len()
                    ));
                }
                Ok(JudgeResponse::Unavailable { reason }) => {
                    tracing::warn!(standard = %self.standard, %reason, "semantic judge unavailable");
                    warnings.push(format!(
                        "semantic judge unavailable ({reason}); heuristic fallback used"
                    ));
                }
                Err(_) => {
                    tracing::warn!(
                        standard = %self.standard,
                        timeout_ms = self.judge_timeout.as_millis() as u64,
                        "semantic judge timed out"
                    );
                    warnings.push("semantic judge timed out; heuristic fallback used".to_string());
                }
            }
        }

        let source = if self.judge.is_some() {
            JudgementSource::Fallback
        } else {
            JudgementSource::Heuristic
        };
        let met = heuristic_met(&applicable, content);
        Self::judgement(&applicable, &met, warnings, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedJudge(JudgeResponse);

    #[async_trait]
    impl SemanticJudge for FixedJudge {
        async fn judge(
            &self,
            _standard: ComplianceStandard,
            _requirements: &[Requirement],
            _content: &str,
            _metadata: &TechnicalMetadata,
            _context: Option<&str>,
        ) -> JudgeResponse {
            self.0.clone()
        }
    }

    struct StalledJudge;

    #[async_trait]
    impl SemanticJudge for StalledJudge {
        async fn judge(
            &self,
            _standard: ComplianceStandard,
            _requirements: &[Requirement],
            _content: &str,
            _metadata: &TechnicalMetadata,
            _context: Option<&str>,
        ) -> JudgeResponse {
            std::future::pending().await
        }
    }

    fn catalog() -> CatalogFramework {
        CatalogFramework::new(
            ComplianceStandard::Dora,
            vec![
                Requirement::new("R-1", "Detect", TagCategory::Monitoring, "Detection by monitoring")
                    .mandatory()
                    .in_phases(&[CrisisPhase::SuspiciousActivity])
                    .with_keywords(&["detect", "alert"]),
                Requirement::new("R-2", "Tell", TagCategory::Communication, "Inform stakeholders")
                    .with_keywords(&["inform"]),
            ],
        )
    }

    const DETECTED: &str = "The SOC raised an ALERT on repeated failed logins";

    #[tokio::test]
    async fn heuristic_applies_phase_scoping() {
        let framework = catalog();
        let meta = TechnicalMetadata::default();

        let judged = framework
            .validate(DETECTED, CrisisPhase::SuspiciousActivity, &meta, None)
            .await;
        assert!(judged.compliant);
        assert_eq!(judged.met, vec!["R-1".to_string()]);
        assert_eq!(judged.missing, vec!["R-2".to_string()]);
        assert_eq!(judged.source, JudgementSource::Heuristic);

        let judged = framework
            .validate("nothing relevant here", CrisisPhase::SuspiciousActivity, &meta, None)
            .await;
        assert!(!judged.compliant);

        // R-1 is out of scope during recovery
        let judged = framework
            .validate("nothing relevant here", CrisisPhase::Recovery, &meta, None)
            .await;
        assert!(judged.compliant);
        assert_eq!(judged.missing, vec!["R-2".to_string()]);
    }

    #[tokio::test]
    async fn semantic_judge_is_preferred() {
        let framework = catalog().with_judge(Arc::new(FixedJudge(JudgeResponse::Judged {
            met: vec!["R-1".into(), "R-2".into()],
            missing: vec![],
        })));
        let judged = framework
            .validate("x", CrisisPhase::SuspiciousActivity, &TechnicalMetadata::default(), None)
            .await;
        assert_eq!(judged.source, JudgementSource::Semantic);
        assert!(judged.missing.is_empty());
    }

    #[tokio::test]
    async fn malformed_and_unavailable_fall_back() {
        for response in [
            JudgeResponse::Malformed { raw: "{{not json".into() },
            JudgeResponse::Unavailable { reason: "503".into() },
        ] {
            let framework = catalog().with_judge(Arc::new(FixedJudge(response)));
            let judged = framework
                .validate(DETECTED, CrisisPhase::SuspiciousActivity, &TechnicalMetadata::default(), None)
                .await;
            assert!(judged.is_fallback());
            assert_eq!(judged.warnings.len(), 1);
            assert!(judged.compliant);
        }
    }

    #[tokio::test]
    async fn stalled_judge_times_out() {
        let framework = catalog()
            .with_judge(Arc::new(StalledJudge))
            .with_judge_timeout(Duration::from_millis(20));
        let judged = framework
            .validate(DETECTED, CrisisPhase::SuspiciousActivity, &TechnicalMetadata::default(), None)
            .await;
        assert_eq!(judged.source, JudgementSource::Fallback);
        assert!(judged.warnings[0].contains("timed out"));
    }

    #[test]
    fn builtin_criteria_satisfy_their_own_requirements() {
        for standard in ComplianceStandard::ALL {
            let framework = CatalogFramework::builtin(standard);
            for req in framework.load_requirements() {
                assert!(!req.keywords.is_empty(), "{} has no keywords", req.id);
                assert!(req.evidenced_by(&req.criteria), "{} criteria lack evidence", req.id);
            }
        }
    }
}
