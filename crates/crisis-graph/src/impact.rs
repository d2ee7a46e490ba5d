//! Cascading-impact scoring
//!
//! Severity and recovery-time estimates for a status change, computed from
//! the number of reachable dependents and the deepest hop that reached them.
//! Reports are advisory: nothing here mutates the graph.

use crate::types::{Criticality, EntityId, EntityStatus, EntityType, RelationshipType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity band of a cascading impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ImpactSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Severity weight of the new status
#[must_use]
pub fn status_multiplier(status: &EntityStatus) -> f64 {
    match status {
        EntityStatus::Compromised => 1.5,
        EntityStatus::Encrypted => 2.0,
        EntityStatus::Offline => 1.3,
        EntityStatus::Degraded => 1.1,
        _ => 1.0,
    }
}

/// Baseline recovery effort of the new status, in hours
#[must_use]
pub fn recovery_base_hours(status: &EntityStatus) -> f64 {
    match status {
        EntityStatus::Compromised => 24.0,
        EntityStatus::Encrypted => 48.0,
        EntityStatus::Offline => 8.0,
        EntityStatus::Degraded => 4.0,
        EntityStatus::Suspicious => 2.0,
        _ => 12.0,
    }
}

/// Raw impact score
#[must_use]
pub fn impact_score(affected_count: usize, max_depth: usize, status: &EntityStatus) -> f64 {
    let base = (10.0 * affected_count as f64).min(100.0);
    let depth_mult = 1.0 + 0.2 * max_depth as f64;
    base * depth_mult * status_multiplier(status)
}

/// Map a score onto its band
#[must_use]
pub fn classify_severity(score: f64) -> ImpactSeverity {
    if score >= 80.0 {
        ImpactSeverity::Critical
    } else if score >= 50.0 {
        ImpactSeverity::High
    } else if score >= 25.0 {
        ImpactSeverity::Medium
    } else {
        ImpactSeverity::Low
    }
}

/// Estimated time to restore service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEstimate {
    pub hours: f64,
    pub display: String,
}

impl RecoveryEstimate {
    /// Estimate recovery for a change reaching `affected_count` dependents
    #[must_use]
    pub fn estimate(affected_count: usize, max_depth: usize, status: &EntityStatus) -> Self {
        let time_mult = 1.0 + 0.5 * (affected_count.max(1) as f64).log10();
        let depth_mult = 1.0 + 0.1 * max_depth as f64;
        let hours = recovery_base_hours(status) * time_mult * depth_mult;
        Self {
            hours,
            display: format_hours(hours),
        }
    }
}

impl fmt::Display for RecoveryEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

fn format_hours(hours: f64) -> String {
    if hours < 1.0 {
        format!("{:.0} minutes", hours * 60.0)
    } else if hours < 24.0 {
        format!("{hours:.1} hours")
    } else {
        format!("{:.1} days", hours / 24.0)
    }
}

/// One dependent reached by the traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedEntity {
    pub entity_id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub criticality: Criticality,
    /// Minimum hop count from the source
    pub depth: usize,
    /// Edge types along the shortest path
    pub relationship_chain: Vec<RelationshipType>,
    /// Entity ids along the shortest path, source first
    pub path: Vec<EntityId>,
}

/// Cascading impact of a hypothetical status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub source: EntityId,
    pub new_status: EntityStatus,
    /// Ordered by (depth, id)
    pub affected: Vec<AffectedEntity>,
    /// Dependents two or more hops away
    pub critical_path: Vec<EntityId>,
    pub max_depth_found: usize,
    pub impact_score: f64,
    pub impact_severity: ImpactSeverity,
    pub estimated_recovery_time: RecoveryEstimate,
}

impl ImpactReport {
    /// Assemble a report from traversal output
    #[must_use]
    pub fn from_affected(
        source: EntityId,
        new_status: EntityStatus,
        affected: Vec<AffectedEntity>,
    ) -> Self {
        let max_depth_found = affected.iter().map(|a| a.depth).max().unwrap_or(0);
        let critical_path = affected
            .iter()
            .filter(|a| a.depth >= 2)
            .map(|a| a.entity_id.clone())
            .collect();
        let score = impact_score(affected.len(), max_depth_found, &new_status);
        let recovery = RecoveryEstimate::estimate(affected.len(), max_depth_found, &new_status);

        Self {
            source,
            new_status,
            affected,
            critical_path,
            max_depth_found,
            impact_score: score,
            impact_severity: classify_severity(score),
            estimated_recovery_time: recovery,
        }
    }

    /// Number of reached dependents
    #[inline]
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    /// Ids of reached dependents in report order
    #[must_use]
    pub fn affected_ids(&self) -> Vec<EntityId> {
        self.affected.iter().map(|a| a.entity_id.clone()).collect()
    }

    /// Reached dependents flagged business-critical
    #[must_use]
    pub fn critical_entities(&self) -> Vec<&AffectedEntity> {
        self.affected
            .iter()
            .filter(|a| a.criticality == Criticality::Critical)
            .collect()
    }
}
