//! DORA (EU 2022/2554) ICT incident requirements

use super::Requirement;
use crate::tags::TagCategory;
use crisis_scenario::CrisisPhase::{
    Containment, EscalationCrisis, InitialIncident, Recovery, SuspiciousActivity,
};

/// DORA requirement catalog
#[must_use]
pub fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::new(
            "DORA-10",
            "Detection of anomalous activities",
            TagCategory::Monitoring,
            "Describe how the anomalous activity was detected and which monitoring alert fired.",
        )
        .mandatory()
        .in_phases(&[SuspiciousActivity])
        .with_keywords(&["detect", "alert", "monitor", "anomal"]),
        Requirement::new(
            "DORA-17",
            "ICT-related incident management process",
            TagCategory::IncidentResponse,
            "State that the incident management process is invoked and who leads the response.",
        )
        .mandatory()
        .in_phases(&[InitialIncident, EscalationCrisis])
        .with_keywords(&["incident management", "incident response", "response team", "escalat"]),
        Requirement::new(
            "DORA-18",
            "Classification of ICT-related incidents",
            TagCategory::IncidentResponse,
            "Give the incident classification, including affected clients and criticality of services.",
        )
        .mandatory()
        .in_phases(&[InitialIncident, EscalationCrisis])
        .with_keywords(&["classif", "major incident", "criticality"]),
        Requirement::new(
            "DORA-19",
            "Reporting of major ICT-related incidents",
            TagCategory::Communication,
            "Note the initial notification to the competent authority within the reporting deadline.",
        )
        .mandatory()
        .in_phases(&[EscalationCrisis])
        .with_keywords(&["competent authority", "regulator", "notification", "notify"]),
        Requirement::new(
            "DORA-11",
            "Response and recovery",
            TagCategory::BusinessContinuity,
            "Reference the ICT business continuity plan and the recovery of affected services.",
        )
        .mandatory()
        .in_phases(&[Containment, Recovery])
        .with_keywords(&["business continuity", "continuity plan", "recover", "restor"]),
        Requirement::new(
            "DORA-14",
            "Communication",
            TagCategory::Communication,
            "Include the communication to clients, counterparts or the public where relevant.",
        )
        .with_keywords(&["communicat", "clients", "public statement", "stakeholder"]),
        Requirement::new(
            "DORA-24",
            "Digital operational resilience testing",
            TagCategory::RecoveryTesting,
            "Confirm restored systems pass resilience testing before returning to production.",
        )
        .in_phases(&[Recovery])
        .with_keywords(&["resilience test", "testing", "validat"]),
    ]
}
