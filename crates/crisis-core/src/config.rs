//! Engine configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! max_iterations = 8
//! standard = "NIST_CSF"
//!
//! [critic]
//! strict_tag_grounding = true
//! ```

use crate::error::EngineError;
use crisis_critic::CriticConfig;
use crisis_graph::{DEFAULT_MAX_DEPTH, DEFAULT_SNAPSHOT_LIMIT};
use crisis_scenario::ComplianceStandard;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scenario engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accepted injects per run
    pub max_iterations: u32,
    /// Rejections tolerated per action before it is abandoned
    pub max_refinements: u32,
    /// Abandoned actions tolerated per run
    pub max_abandoned_actions: u32,
    /// Bound on every collaborator call
    pub collaborator_timeout_ms: u64,
    /// Default compliance standard for new scenarios
    pub standard: ComplianceStandard,
    /// Seed for the reference action selector
    pub seed: u64,
    /// Topology template loaded by the CLI
    pub template: String,
    /// Cap on unfiltered state snapshots
    pub snapshot_limit: usize,
    /// Depth of impact reports
    pub impact_depth: usize,
    pub critic: CriticConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_refinements: 3,
            max_abandoned_actions: 5,
            collaborator_timeout_ms: 30_000,
            standard: ComplianceStandard::Dora,
            seed: 42,
            template: "financial_institution".to_string(),
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            impact_depth: DEFAULT_MAX_DEPTH,
            critic: CriticConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.collaborator_timeout_ms == 0 {
            return Err(EngineError::Config(
                "collaborator_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_abandoned_actions == 0 {
            return Err(EngineError::Config(
                "max_abandoned_actions must be at least 1".to_string(),
            ));
        }
        if self.critic.min_content_length == 0 {
            return Err(EngineError::Config(
                "critic.min_content_length must be positive".to_string(),
            ));
        }
        if self.snapshot_limit == 0 {
            return Err(EngineError::Config("snapshot_limit must be positive".to_string()));
        }
        Ok(())
    }

    /// Collaborator timeout as a duration
    #[inline]
    #[must_use]
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// With iteration budget
    #[inline]
    #[must_use]
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// With refinement budget
    #[inline]
    #[must_use]
    pub fn with_max_refinements(mut self, max: u32) -> Self {
        self.max_refinements = max;
        self
    }

    /// With abandonment budget
    #[inline]
    #[must_use]
    pub fn with_max_abandoned_actions(mut self, max: u32) -> Self {
        self.max_abandoned_actions = max;
        self
    }

    /// With collaborator timeout
    #[inline]
    #[must_use]
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With default standard
    #[inline]
    #[must_use]
    pub fn with_standard(mut self, standard: ComplianceStandard) -> Self {
        self.standard = standard;
        self
    }

    /// With selector seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With critic settings
    #[inline]
    #[must_use]
    pub fn with_critic(mut self, critic: CriticConfig) -> Self {
        self.critic = critic;
        self
    }
}
