//! Scenario vocabulary
//!
//! Identifiers, crisis phases, time offsets and the enumerations that
//! describe a single inject.

use crate::error::ScenarioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique scenario identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub Ulid);

impl ScenarioId {
    /// Generate new scenario ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScenarioId {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|_| ScenarioError::InvalidScenarioId(s.to_string()))
    }
}

/// Inject identifier, unique within a scenario (e.g. `INJ-003`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InjectId(pub String);

impl InjectId {
    /// Sequential id for the `n`th inject of a timeline, starting at 1
    #[must_use]
    pub fn sequential(n: usize) -> Self {
        Self(format!("INJ-{n:03}"))
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of crisis being simulated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScenarioType {
    Ransomware,
    DataBreach,
    Ddos,
    InsiderThreat,
    SupplyChain,
    Other(String),
}

impl ScenarioType {
    /// Canonical snake_case name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ransomware => "ransomware",
            Self::DataBreach => "data_breach",
            Self::Ddos => "ddos",
            Self::InsiderThreat => "insider_threat",
            Self::SupplyChain => "supply_chain",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ScenarioType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "ransomware" => Self::Ransomware,
            "data_breach" => Self::DataBreach,
            "ddos" => Self::Ddos,
            "insider_threat" => Self::InsiderThreat,
            "supply_chain" => Self::SupplyChain,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ScenarioType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ScenarioType> for String {
    fn from(value: ScenarioType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered stage of a crisis
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrisisPhase {
    #[default]
    NormalOperation,
    SuspiciousActivity,
    InitialIncident,
    EscalationCrisis,
    Containment,
    Recovery,
}

impl CrisisPhase {
    /// All phases in crisis order
    pub const ALL: [CrisisPhase; 6] = [
        Self::NormalOperation,
        Self::SuspiciousActivity,
        Self::InitialIncident,
        Self::EscalationCrisis,
        Self::Containment,
        Self::Recovery,
    ];

    /// Following phase, `None` after recovery
    #[must_use]
    pub fn next(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// Phases in which compromised assets may be declared healthy again
    #[inline]
    #[must_use]
    pub fn permits_restoration(self) -> bool {
        matches!(self, Self::Containment | Self::Recovery)
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalOperation => "NORMAL_OPERATION",
            Self::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
            Self::InitialIncident => "INITIAL_INCIDENT",
            Self::EscalationCrisis => "ESCALATION_CRISIS",
            Self::Containment => "CONTAINMENT",
            Self::Recovery => "RECOVERY",
        }
    }
}

impl fmt::Display for CrisisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrisisPhase {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| ScenarioError::UnknownPhase(s.to_string()))
    }
}

/// Minutes elapsed since scenario start
///
/// Rendered as `T+HH:MM` below one day and `T+DD:HH:MM` from one day on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOffset(u32);

impl TimeOffset {
    /// Scenario start
    pub const ZERO: Self = Self(0);

    /// Offset of `minutes` minutes
    #[inline]
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Offset of `hours` hours and `minutes` minutes
    #[inline]
    #[must_use]
    pub const fn from_hm(hours: u32, minutes: u32) -> Self {
        Self(hours * 60 + minutes)
    }

    /// Total minutes
    #[inline]
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Offset advanced by `minutes`
    #[inline]
    #[must_use]
    pub const fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / (24 * 60);
        let hours = (self.0 / 60) % 24;
        let minutes = self.0 % 60;
        if days == 0 {
            write!(f, "T+{hours:02}:{minutes:02}")
        } else {
            write!(f, "T+{days:02}:{hours:02}:{minutes:02}")
        }
    }
}

impl FromStr for TimeOffset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScenarioError::InvalidTimeOffset(s.to_string());
        let body = s.trim().strip_prefix("T+").ok_or_else(invalid)?;

        let fields = body
            .split(':')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u32>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (days, hours, minutes) = match fields.as_slice() {
            [h, m] => (0, *h, *m),
            [d, h, m] if *h < 24 => (*d, *h, *m),
            _ => return Err(invalid()),
        };
        if minutes >= 60 {
            return Err(invalid());
        }

        days.checked_mul(24 * 60)
            .and_then(|d| hours.checked_mul(60).and_then(|h| d.checked_add(h)))
            .and_then(|t| t.checked_add(minutes))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOffset {
    type Error = ScenarioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOffset> for String {
    fn from(value: TimeOffset) -> Self {
        value.to_string()
    }
}

/// Channel through which an inject reaches the exercise participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Email,
    Phone,
    SiemAlert,
    Chat,
    News,
    SocialMedia,
    Report,
}

/// Operational severity of an inject
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InjectSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Regulatory standard a scenario is exercised against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ComplianceStandard {
    #[default]
    #[serde(rename = "DORA")]
    Dora,
    #[serde(rename = "NIST_CSF")]
    NistCsf,
    #[serde(rename = "ISO27001")]
    Iso27001,
}

impl ComplianceStandard {
    /// All supported standards
    pub const ALL: [ComplianceStandard; 3] = [Self::Dora, Self::NistCsf, Self::Iso27001];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dora => "DORA",
            Self::NistCsf => "NIST_CSF",
            Self::Iso27001 => "ISO27001",
        }
    }
}

impl fmt::Display for ComplianceStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceStandard {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "DORA" => Ok(Self::Dora),
            "NIST" | "NIST_CSF" => Ok(Self::NistCsf),
            "ISO27001" | "ISO_27001" => Ok(Self::Iso27001),
            _ => Err(ScenarioError::UnknownStandard(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_parse_and_render() {
        let t: TimeOffset = "T+01:30".parse().unwrap();
        assert_eq!(t.minutes(), 90);
        assert_eq!(t.to_string(), "T+01:30");

        let t: TimeOffset = "T+02:03:15".parse().unwrap();
        assert_eq!(t.minutes(), 2 * 1440 + 3 * 60 + 15);
        assert_eq!(t.to_string(), "T+02:03:15");

        // hours past a day roll into the day field on render
        let t: TimeOffset = "T+25:00".parse().unwrap();
        assert_eq!(t.to_string(), "T+01:01:00");
    }

    #[test]
    fn offsets_reject_malformed_input() {
        for bad in ["01:00", "T+1", "T+01:60", "T+01:24:00", "T+aa:00", "T+:00", "T+-1:00"] {
            assert!(bad.parse::<TimeOffset>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn offsets_serialize_as_strings() {
        let json = serde_json::to_string(&TimeOffset::from_hm(1, 0)).unwrap();
        assert_eq!(json, "\"T+01:00\"");
        let back: TimeOffset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TimeOffset::from_minutes(60));
    }

    #[test]
    fn phases_are_ordered() {
        assert!(CrisisPhase::SuspiciousActivity < CrisisPhase::InitialIncident);
        assert_eq!(CrisisPhase::Containment.next(), Some(CrisisPhase::Recovery));
        assert_eq!(CrisisPhase::Recovery.next(), None);
        assert_eq!(
            "escalation crisis".parse::<CrisisPhase>().unwrap(),
            CrisisPhase::EscalationCrisis
        );
    }

    #[test]
    fn standards_accept_aliases() {
        assert_eq!("nist".parse::<ComplianceStandard>().unwrap(), ComplianceStandard::NistCsf);
        assert_eq!("ISO-27001".parse::<ComplianceStandard>().unwrap(), ComplianceStandard::Iso27001);
        assert!("SOX".parse::<ComplianceStandard>().is_err());
    }

    #[test]
    fn scenario_ids_round_trip_through_text() {
        let id = ScenarioId::new();
        assert_eq!(id.to_string().parse::<ScenarioId>().unwrap(), id);
        assert!("not-a-ulid".parse::<ScenarioId>().is_err());
    }
}
