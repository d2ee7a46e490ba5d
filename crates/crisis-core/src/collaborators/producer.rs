//! Reference content producer
//!
//! Renders an inject from fixed phrasing per crisis phase. Rejected drafts
//! are reworked from the critic's feedback: missing requirements get their
//! criteria appended and unsupported tags are dropped.

use super::{ContentProducer, DraftRequest, DraftResponse};
use async_trait::async_trait;
use crisis_critic::{CheckKind, TagCategory};
use crisis_scenario::{CrisisPhase, Inject, InjectSeverity, Modality};

struct PhaseStyle {
    source: &'static str,
    recipient: &'static str,
    modality: Modality,
    severity: InjectSeverity,
    interval_minutes: u32,
    narrative: &'static str,
    tag: TagCategory,
}

fn style(phase: CrisisPhase) -> PhaseStyle {
    match phase {
        CrisisPhase::NormalOperation => PhaseStyle {
            source: "IT Operations",
            recipient: "Service Desk",
            modality: Modality::Email,
            severity: InjectSeverity::Low,
            interval_minutes: 30,
            narrative: "Operations continue as planned while the team reviews routine logs.",
            tag: TagCategory::Monitoring,
        },
        CrisisPhase::SuspiciousActivity => PhaseStyle {
            source: "SIEM",
            recipient: "SOC Analyst",
            modality: Modality::SiemAlert,
            severity: InjectSeverity::Low,
            interval_minutes: 20,
            narrative: "Monitoring flagged the activity for review by the on-call analyst.",
            tag: TagCategory::Monitoring,
        },
        CrisisPhase::InitialIncident => PhaseStyle {
            source: "SOC",
            recipient: "Incident Response Team",
            modality: Modality::Chat,
            severity: InjectSeverity::Medium,
            interval_minutes: 30,
            narrative: "The on-call analyst confirms a security incident and opens a ticket.",
            tag: TagCategory::IncidentResponse,
        },
        CrisisPhase::EscalationCrisis => PhaseStyle {
            source: "CISO",
            recipient: "Crisis Management Team",
            modality: Modality::Phone,
            severity: InjectSeverity::Critical,
            interval_minutes: 45,
            narrative: "The situation escalates as dependent business services degrade.",
            tag: TagCategory::IncidentResponse,
        },
        CrisisPhase::Containment => PhaseStyle {
            source: "Incident Response Team",
            recipient: "IT Operations",
            modality: Modality::Chat,
            severity: InjectSeverity::High,
            interval_minutes: 60,
            narrative: "Responders move to contain further spread.",
            tag: TagCategory::IncidentResponse,
        },
        CrisisPhase::Recovery => PhaseStyle {
            source: "IT Operations",
            recipient: "Crisis Management Team",
            modality: Modality::Report,
            severity: InjectSeverity::Medium,
            interval_minutes: 120,
            narrative: "Service owners bring operations back from known-good backups.",
            tag: TagCategory::BusinessContinuity,
        },
    }
}

/// Template-driven producer used when no model-backed producer is wired in
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContentProducer;

impl TemplateContentProducer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn content(request: &DraftRequest, style: &PhaseStyle) -> String {
        let action = &request.action;
        let mut content = match &action.target {
            Some(id) => format!(
                "{} ({id}). {}",
                action.description.trim_end_matches('.'),
                style.narrative
            ),
            None => format!("{}. {}", action.description.trim_end_matches('.'), style.narrative),
        };

        for finding in &request.feedback {
            match (finding.check, &finding.remediation) {
                (CheckKind::MandatoryRequirement, Some(criteria)) => {
                    content.push(' ');
                    content.push_str(criteria);
                }
                (CheckKind::Structure, _) if finding.code == "content_too_short" => {
                    content.push_str(" Objective: ");
                    content.push_str(&request.objective);
                    content.push('.');
                }
                _ => {}
            }
        }
        content
    }
}

#[async_trait]
impl ContentProducer for TemplateContentProducer {
    async fn draft(&self, request: &DraftRequest) -> DraftResponse {
        let style = style(request.phase);
        let content = Self::content(request, &style);
        let offset = request.not_before.plus_minutes(style.interval_minutes);

        let mut inject = Inject::new(request.inject_id.clone(), offset, request.phase, content)
            .with_route(style.source, style.recipient)
            .with_modality(style.modality)
            .with_severity(style.severity);

        let action = &request.action;
        if let Some(technique) = &action.technique {
            inject = inject.with_mitre(technique.clone());
        }
        match (&action.target, &action.status_effect) {
            (Some(id), Some(status)) => inject = inject.with_effect(id.clone(), status.clone()),
            (Some(id), None) => inject = inject.with_asset(id.clone()),
            _ => {}
        }

        let tag_dropped = request
            .feedback
            .iter()
            .any(|f| f.check == CheckKind::TagGrounding && f.is_error());
        if !tag_dropped && style.tag.grounded_in(&inject.content) {
            inject = inject.with_tag(request.standard, style.tag.as_str());
        }

        DraftResponse::Draft(inject)
    }
}
