//! Verdicts and findings

use crate::framework::ComplianceJudgement;
use crisis_graph::EntityId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which check produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Structure,
    Causality,
    StateConsistency,
    TagGrounding,
    MandatoryRequirement,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Structure => "structure",
            Self::Causality => "causality",
            Self::StateConsistency => "state_consistency",
            Self::TagGrounding => "tag_grounding",
            Self::MandatoryRequirement => "mandatory_requirement",
        };
        f.write_str(s)
    }
}

/// Whether a finding blocks acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One itemized reason attached to a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: CheckKind,
    pub severity: Severity,
    /// Stable machine-readable code (e.g. `teleportation`)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<EntityId>,
    /// How a revised draft can address the finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Finding {
    /// Blocking finding
    #[must_use]
    pub fn error(check: CheckKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            asset: None,
            remediation: None,
        }
    }

    /// Non-blocking finding
    #[must_use]
    pub fn warning(check: CheckKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(check, code, message)
        }
    }

    /// With the asset the finding is about
    #[inline]
    #[must_use]
    pub fn with_asset(mut self, asset: impl Into<EntityId>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// With a remediation hint
    #[inline]
    #[must_use]
    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = Some(hint.into());
        self
    }

    /// Downgrade or upgrade to `severity`
    #[inline]
    #[must_use]
    pub fn at(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.check, self.code, self.message)
    }
}

/// Why an affected asset was causally admissible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "via")]
pub enum Precedent {
    /// Opening inject declaring the attacker's foothold
    InitialFoothold,
    /// Touched by an earlier accepted inject
    PriorInject,
    /// Reachable over a causal edge from a precedent asset
    CausalEdgeFrom(EntityId),
}

/// Supporting data gathered while validating
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerdictDetails {
    pub precedents: BTreeMap<EntityId, Precedent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceJudgement>,
    /// Compliance judgement was served from cache
    pub compliance_cached: bool,
}

/// Outcome of validating one draft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticVerdict {
    pub accepted: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub details: VerdictDetails,
}

impl CriticVerdict {
    /// Split findings by severity; accepted iff no errors
    #[must_use]
    pub fn from_findings(findings: Vec<Finding>, details: VerdictDetails) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(Finding::is_error);
        Self {
            accepted: errors.is_empty(),
            errors,
            warnings,
            details,
        }
    }

    /// Whether any error names `asset`
    #[must_use]
    pub fn rejects_asset(&self, asset: &EntityId) -> bool {
        self.errors.iter().any(|f| f.asset.as_ref() == Some(asset))
    }

    /// Whether any error came from `check`
    #[must_use]
    pub fn failed(&self, check: CheckKind) -> bool {
        self.errors.iter().any(|f| f.check == check)
    }

    /// Rendered error lines
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_accepts_only_without_errors() {
        let warn = Finding::warning(CheckKind::TagGrounding, "unsupported_tag", "w");
        let verdict = CriticVerdict::from_findings(vec![warn.clone()], VerdictDetails::default());
        assert!(verdict.accepted);
        assert_eq!(verdict.warnings, vec![warn]);

        let err = Finding::error(CheckKind::Causality, "teleportation", "no precedent")
            .with_asset("DB-01");
        let verdict = CriticVerdict::from_findings(vec![err], VerdictDetails::default());
        assert!(!verdict.accepted);
        assert!(verdict.rejects_asset(&"DB-01".into()));
        assert!(verdict.failed(CheckKind::Causality));
        assert_eq!(
            verdict.error_messages(),
            vec!["[causality/teleportation] no precedent".to_string()]
        );
    }
}
