//! Compliance-tag grounding
//!
//! A draft may claim compliance categories per standard. Each claim must be
//! backed by vocabulary of that category somewhere in the content.

use crate::verdict::{CheckKind, Finding, Severity};
use crisis_scenario::Inject;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Compliance category a tag can claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TagCategory {
    IncidentResponse,
    BusinessContinuity,
    RecoveryTesting,
    Communication,
    Monitoring,
}

impl TagCategory {
    /// All categories
    pub const ALL: [TagCategory; 5] = [
        Self::IncidentResponse,
        Self::BusinessContinuity,
        Self::RecoveryTesting,
        Self::Communication,
        Self::Monitoring,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncidentResponse => "IncidentResponse",
            Self::BusinessContinuity => "BusinessContinuity",
            Self::RecoveryTesting => "RecoveryTesting",
            Self::Communication => "Communication",
            Self::Monitoring => "Monitoring",
        }
    }

    /// Whether `content` contains vocabulary of this category
    #[must_use]
    pub fn grounded_in(self, content: &str) -> bool {
        KEYWORDS
            .iter()
            .find(|(category, _)| *category == self)
            .is_some_and(|(_, pattern)| pattern.is_match(content))
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagCategory {
    type Err = String;

    /// Accepts `IncidentResponse`, `incident_response` and `Incident Response`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_ascii_lowercase() == key)
            .ok_or_else(|| format!("unknown compliance category: {s}"))
    }
}

static KEYWORDS: Lazy<Vec<(TagCategory, Regex)>> = Lazy::new(|| {
    [
        (
            TagCategory::IncidentResponse,
            r"(?i)\b(incident|respon\w*|contain\w*|isolat\w*|triage\w*|escalat\w*|investigat\w*|forensic\w*)",
        ),
        (
            TagCategory::BusinessContinuity,
            r"(?i)\b(continuity|failover|fail over|backups?|alternate|manual (process|workaround)|workaround\w*|resilien\w*|degraded mode)",
        ),
        (
            TagCategory::RecoveryTesting,
            r"(?i)\b(restor\w*|recover\w*|rto|rpo|test\w*|rebuil\w*|validat\w*)",
        ),
        (
            TagCategory::Communication,
            r"(?i)\b(notif\w*|communicat\w*|regulator\w*|press|media|customers?|clients?|stakeholders?|inform\w*|brief\w*)",
        ),
        (
            TagCategory::Monitoring,
            r"(?i)\b(monitor\w*|alert\w*|siem|detect\w*|logs?|anomal\w*|ids|edr|telemetry)\b",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| {
        (
            category,
            Regex::new(pattern).expect("invalid built-in tag keyword pattern"),
        )
    })
    .collect()
});

/// Check every compliance tag of `draft` against the keyword table
///
/// Unsupported and unknown tags are reported at `severity`.
#[must_use]
pub fn check_tags(draft: &Inject, severity: Severity) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (standard, categories) in &draft.compliance_tags {
        for raw in categories {
            match raw.parse::<TagCategory>() {
                Ok(category) if category.grounded_in(&draft.content) => {}
                Ok(category) => findings.push(
                    Finding::error(
                        CheckKind::TagGrounding,
                        "unsupported_tag",
                        format!("{standard} tag {category} has no supporting evidence in content"),
                    )
                    .at(severity)
                    .with_remediation(format!(
                        "describe the {category} activity explicitly or drop the tag"
                    )),
                ),
                Err(_) => findings.push(
                    Finding::error(
                        CheckKind::TagGrounding,
                        "unknown_tag_category",
                        format!("{standard} tag '{raw}' is not a known compliance category"),
                    )
                    .at(severity)
                    .with_remediation(format!(
                        "use one of: {}",
                        TagCategory::ALL.map(TagCategory::as_str).join(", ")
                    )),
                ),
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crisis_scenario::{ComplianceStandard, CrisisPhase, TimeOffset};

    fn draft(content: &str) -> Inject {
        Inject::new("INJ-001", TimeOffset::ZERO, CrisisPhase::InitialIncident, content)
    }

    #[test]
    fn categories_parse_loosely() {
        assert_eq!("incident_response".parse(), Ok(TagCategory::IncidentResponse));
        assert_eq!("Business Continuity".parse(), Ok(TagCategory::BusinessContinuity));
        assert!("Vibes".parse::<TagCategory>().is_err());
    }

    #[test]
    fn grounding_uses_word_boundaries() {
        assert!(TagCategory::Monitoring.grounded_in("The SIEM raised an alert"));
        assert!(!TagCategory::Monitoring.grounded_in("Holidays are valid"));
        assert!(TagCategory::RecoveryTesting.grounded_in("Restoration from backup begins"));
    }

    #[test]
    fn unsupported_tags_are_reported_at_requested_severity() {
        let inject = draft("Ransom note displayed on finance workstations after encryption")
            .with_tag(ComplianceStandard::Dora, "Monitoring")
            .with_tag(ComplianceStandard::Dora, "Astrology");

        let findings = check_tags(&inject, Severity::Warning);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| !f.is_error()));
        assert_eq!(findings[0].code, "unsupported_tag");
        assert_eq!(findings[1].code, "unknown_tag_category");

        let findings = check_tags(&inject, Severity::Error);
        assert!(findings.iter().all(Finding::is_error));
    }

    #[test]
    fn grounded_tags_pass() {
        let inject = draft("SOC escalates the incident to the CISO after the EDR alert")
            .with_tag(ComplianceStandard::NistCsf, "IncidentResponse")
            .with_tag(ComplianceStandard::NistCsf, "Monitoring");
        assert!(check_tags(&inject, Severity::Error).is_empty());
    }
}
