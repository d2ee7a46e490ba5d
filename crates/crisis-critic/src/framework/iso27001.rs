//! ISO/IEC 27001:2022 Annex A incident controls

use super::Requirement;
use crate::tags::TagCategory;
use crisis_scenario::CrisisPhase::{
    Containment, EscalationCrisis, InitialIncident, Recovery, SuspiciousActivity,
};

/// ISO 27001 requirement catalog
#[must_use]
pub fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::new(
            "A.5.25",
            "Assessment and decision on information security events",
            TagCategory::Monitoring,
            "Record the assessment of the security event and whether it is declared an incident.",
        )
        .mandatory()
        .in_phases(&[SuspiciousActivity, InitialIncident])
        .with_keywords(&["assess", "security event", "detect", "triage"]),
        Requirement::new(
            "A.5.24",
            "Incident management planning and preparation",
            TagCategory::IncidentResponse,
            "Refer to the documented incident response procedure and assigned responsibilities.",
        )
        .mandatory()
        .in_phases(&[InitialIncident])
        .with_keywords(&["procedure", "incident response", "playbook", "responsib"]),
        Requirement::new(
            "A.5.26",
            "Response to information security incidents",
            TagCategory::IncidentResponse,
            "Describe the response: containment, escalation and evidence handling.",
        )
        .mandatory()
        .in_phases(&[EscalationCrisis, Containment])
        .with_keywords(&["contain", "escalat", "isolat", "evidence"]),
        Requirement::new(
            "A.5.29",
            "Information security during disruption",
            TagCategory::BusinessContinuity,
            "Explain how security is maintained while continuity arrangements restore service.",
        )
        .mandatory()
        .in_phases(&[Recovery])
        .with_keywords(&["continuity", "restor", "recover", "fallback"]),
        Requirement::new(
            "A.5.27",
            "Learning from information security incidents",
            TagCategory::RecoveryTesting,
            "Capture lessons learned and the tests that validate the corrective actions.",
        )
        .in_phases(&[Recovery])
        .with_keywords(&["lessons learned", "post-incident", "validat"]),
        Requirement::new(
            "A.8.16",
            "Monitoring activities",
            TagCategory::Monitoring,
            "Reference the monitoring of networks and systems for anomalous behaviour.",
        )
        .with_keywords(&["monitor", "siem", "log"]),
    ]
}
