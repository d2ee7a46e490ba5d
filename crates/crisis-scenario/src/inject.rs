//! Inject model
//!
//! An inject is one atomic event on the scenario timeline. Drafts and
//! accepted injects share this type; acceptance is decided by the critic.

use crate::types::{ComplianceStandard, CrisisPhase, InjectId, InjectSeverity, Modality, TimeOffset};
use crisis_graph::{EntityId, EntityStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Technique, asset and state-change details of an inject
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TechnicalMetadata {
    /// MITRE ATT&CK technique id (e.g. `T1566`)
    #[serde(default)]
    pub mitre_id: Option<String>,
    #[serde(default)]
    pub affected_assets: Vec<EntityId>,
    #[serde(default)]
    pub severity: InjectSeverity,
    /// Status applied to each entity when the inject is committed
    #[serde(default)]
    pub status_effects: BTreeMap<EntityId, EntityStatus>,
}

/// One scenario event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inject {
    pub inject_id: InjectId,
    pub time_offset: TimeOffset,
    pub phase: CrisisPhase,
    /// Sender as seen by participants (e.g. `SOC`)
    pub source: String,
    /// Recipient role (e.g. `CISO`)
    pub target: String,
    pub modality: Modality,
    pub content: String,
    #[serde(default)]
    pub technical_metadata: TechnicalMetadata,
    /// Standard to claimed compliance categories
    #[serde(default)]
    pub compliance_tags: BTreeMap<ComplianceStandard, Vec<String>>,
}

impl Inject {
    /// Create an inject with empty metadata
    #[must_use]
    pub fn new(
        inject_id: impl Into<InjectId>,
        time_offset: TimeOffset,
        phase: CrisisPhase,
        content: impl Into<String>,
    ) -> Self {
        Self {
            inject_id: inject_id.into(),
            time_offset,
            phase,
            source: "SOC".to_string(),
            target: "Incident Response Team".to_string(),
            modality: Modality::default(),
            content: content.into(),
            technical_metadata: TechnicalMetadata::default(),
            compliance_tags: BTreeMap::new(),
        }
    }

    /// With sender and recipient
    #[inline]
    #[must_use]
    pub fn with_route(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source = source.into();
        self.target = target.into();
        self
    }

    /// With delivery channel
    #[inline]
    #[must_use]
    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    /// With MITRE technique
    #[inline]
    #[must_use]
    pub fn with_mitre(mut self, mitre_id: impl Into<String>) -> Self {
        self.technical_metadata.mitre_id = Some(mitre_id.into());
        self
    }

    /// With severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: InjectSeverity) -> Self {
        self.technical_metadata.severity = severity;
        self
    }

    /// With an affected asset
    #[must_use]
    pub fn with_asset(mut self, id: impl Into<EntityId>) -> Self {
        let id = id.into();
        if !self.technical_metadata.affected_assets.contains(&id) {
            self.technical_metadata.affected_assets.push(id);
        }
        self
    }

    /// With a status effect; the entity is also recorded as affected
    #[must_use]
    pub fn with_effect(mut self, id: impl Into<EntityId>, status: EntityStatus) -> Self {
        let id = id.into();
        self = self.with_asset(id.clone());
        self.technical_metadata.status_effects.insert(id, status);
        self
    }

    /// With a compliance tag
    #[must_use]
    pub fn with_tag(mut self, standard: ComplianceStandard, category: impl Into<String>) -> Self {
        self.compliance_tags
            .entry(standard)
            .or_default()
            .push(category.into());
        self
    }

    /// Affected assets
    #[inline]
    #[must_use]
    pub fn affected_assets(&self) -> &[EntityId] {
        &self.technical_metadata.affected_assets
    }

    /// Status effects as an ordered change list
    #[must_use]
    pub fn status_changes(&self) -> Vec<(EntityId, EntityStatus)> {
        self.technical_metadata
            .status_effects
            .iter()
            .map(|(id, status)| (id.clone(), status.clone()))
            .collect()
    }

    /// Whether committing this inject puts `id` in a compromise-class status
    #[must_use]
    pub fn compromises(&self, id: &EntityId) -> bool {
        self.technical_metadata
            .status_effects
            .get(id)
            .is_some_and(EntityStatus::is_compromise_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_imply_affected_assets() {
        let inject = Inject::new("INJ-001", TimeOffset::ZERO, CrisisPhase::InitialIncident, "x")
            .with_effect("DB-01", EntityStatus::Compromised)
            .with_asset("DB-01");

        assert_eq!(inject.affected_assets(), &[EntityId::from("DB-01")]);
        assert!(inject.compromises(&"DB-01".into()));
        assert!(!inject.compromises(&"DB-02".into()));
    }

    #[test]
    fn deserializes_with_sparse_metadata() {
        let json = r#"{
            "inject_id": "INJ-004",
            "time_offset": "T+02:15",
            "phase": "ESCALATION_CRISIS",
            "source": "SOC",
            "target": "CISO",
            "modality": "siem_alert",
            "content": "Encryption activity observed on the core banking database",
            "technical_metadata": {
                "affected_assets": ["DB-01"],
                "status_effects": {"DB-01": "encrypted"}
            },
            "compliance_tags": {"DORA": ["IncidentResponse"]}
        }"#;
        let inject: Inject = serde_json::from_str(json).unwrap();
        assert_eq!(inject.time_offset, TimeOffset::from_hm(2, 15));
        assert_eq!(inject.technical_metadata.severity, InjectSeverity::Medium);
        assert!(inject.compromises(&"DB-01".into()));
        assert_eq!(
            inject.compliance_tags[&ComplianceStandard::Dora],
            vec!["IncidentResponse".to_string()]
        );
    }
}
