//! NIST Cybersecurity Framework respond/recover outcomes

use super::Requirement;
use crate::tags::TagCategory;
use crisis_scenario::CrisisPhase::{
    Containment, EscalationCrisis, InitialIncident, Recovery, SuspiciousActivity,
};

/// NIST CSF requirement catalog
#[must_use]
pub fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::new(
            "DE.AE",
            "Anomalies and events are analyzed",
            TagCategory::Monitoring,
            "Describe the detected anomaly and the alert or event data that revealed it.",
        )
        .mandatory()
        .in_phases(&[SuspiciousActivity, InitialIncident])
        .with_keywords(&["detect", "alert", "anomal", "event"]),
        Requirement::new(
            "RS.MA",
            "Incident management",
            TagCategory::IncidentResponse,
            "Show the incident response plan is executed and the incident triaged and escalated.",
        )
        .mandatory()
        .in_phases(&[InitialIncident, EscalationCrisis])
        .with_keywords(&["incident response", "triage", "escalat", "response plan"]),
        Requirement::new(
            "RS.AN",
            "Incident analysis",
            TagCategory::IncidentResponse,
            "Mention the forensic investigation into root cause and scope.",
        )
        .in_phases(&[EscalationCrisis, Containment])
        .with_keywords(&["forensic", "investigat", "root cause"]),
        Requirement::new(
            "RS.MI",
            "Incident mitigation",
            TagCategory::IncidentResponse,
            "State the containment action taken, such as isolating hosts or blocking accounts.",
        )
        .mandatory()
        .in_phases(&[Containment])
        .with_keywords(&["contain", "isolat", "block", "mitigat"]),
        Requirement::new(
            "RS.CO",
            "Incident response reporting and communication",
            TagCategory::Communication,
            "Note which internal and external stakeholders are informed.",
        )
        .with_keywords(&["stakeholder", "inform", "communicat", "notif"]),
        Requirement::new(
            "RC.RP",
            "Incident recovery plan execution",
            TagCategory::BusinessContinuity,
            "Describe recovery plan execution and restoration from trusted backups.",
        )
        .mandatory()
        .in_phases(&[Recovery])
        .with_keywords(&["recover", "restor", "backup", "rebuild"]),
    ]
}
