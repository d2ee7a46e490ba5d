//! Scenario persistence
//!
//! A [`ScenarioRecord`] is written once per committed inject and read back by
//! id or listed with filters. Two backends ship: an in-memory map for tests
//! and embedding, and a directory of JSON documents.

use crate::error::ScenarioError;
use crate::inject::Inject;
use crate::state::ScenarioState;
use crate::types::{ComplianceStandard, CrisisPhase, ScenarioId, ScenarioType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted view of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_id: ScenarioId,
    pub scenario_type: ScenarioType,
    pub standard: ComplianceStandard,
    #[serde(default)]
    pub user: Option<String>,
    pub phase: CrisisPhase,
    pub injects: Vec<Inject>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScenarioRecord {
    /// Snapshot committed state
    #[must_use]
    pub fn from_state(state: &ScenarioState) -> Self {
        Self {
            scenario_id: state.scenario_id,
            scenario_type: state.scenario_type.clone(),
            standard: state.standard,
            user: state.user.clone(),
            phase: state.current_phase,
            injects: state.injects.clone(),
            errors: state.errors.clone(),
            warnings: state.warnings.clone(),
            created_at: state.started_at,
            updated_at: Utc::now(),
        }
    }
}

/// Listing filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    pub user: Option<String>,
    pub scenario_type: Option<ScenarioType>,
    pub limit: Option<usize>,
}

impl ScenarioFilter {
    /// Match everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only scenarios owned by `user`
    #[inline]
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Only scenarios of `scenario_type`
    #[inline]
    #[must_use]
    pub fn with_type(mut self, scenario_type: ScenarioType) -> Self {
        self.scenario_type = Some(scenario_type);
        self
    }

    /// At most `limit` results
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, record: &ScenarioRecord) -> bool {
        self.user
            .as_ref()
            .map_or(true, |u| record.user.as_ref() == Some(u))
            && self
                .scenario_type
                .as_ref()
                .map_or(true, |t| &record.scenario_type == t)
    }

    /// Filter, order newest first and truncate
    fn apply(&self, records: impl IntoIterator<Item = ScenarioRecord>) -> Vec<ScenarioRecord> {
        let mut matched: Vec<_> = records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.scenario_id.cmp(&a.scenario_id))
        });
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Scenario record storage
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Insert or replace a record
    async fn save(&self, record: &ScenarioRecord) -> Result<(), ScenarioError>;

    /// Load by id
    async fn load(&self, id: &ScenarioId) -> Result<ScenarioRecord, ScenarioError>;

    /// Matching records, most recently updated first
    async fn list(&self, filter: &ScenarioFilter) -> Result<Vec<ScenarioRecord>, ScenarioError>;
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: DashMap<ScenarioId, ScenarioRecord>,
}

impl InMemoryRepository {
    /// Create empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ScenarioRepository for InMemoryRepository {
    async fn save(&self, record: &ScenarioRecord) -> Result<(), ScenarioError> {
        self.records.insert(record.scenario_id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &ScenarioId) -> Result<ScenarioRecord, ScenarioError> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(ScenarioError::NotFound(*id))
    }

    async fn list(&self, filter: &ScenarioFilter) -> Result<Vec<ScenarioRecord>, ScenarioError> {
        let snapshot: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        Ok(filter.apply(snapshot))
    }
}

/// One pretty-printed JSON document per scenario under a directory
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Open a repository rooted at `dir`, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, ScenarioError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ScenarioId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl ScenarioRepository for JsonFileRepository {
    async fn save(&self, record: &ScenarioRecord) -> Result<(), ScenarioError> {
        let json = serde_json::to_vec_pretty(record)?;
        let path = self.path_for(&record.scenario_id);

        // write-then-rename so readers never see a partial document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            scenario = %record.scenario_id,
            injects = record.injects.len(),
            path = %path.display(),
            "scenario record saved"
        );
        Ok(())
    }

    async fn load(&self, id: &ScenarioId) -> Result<ScenarioRecord, ScenarioError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScenarioError::NotFound(*id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list(&self, filter: &ScenarioFilter) -> Result<Vec<ScenarioRecord>, ScenarioError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<ScenarioRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable scenario record");
                }
            }
        }

        Ok(filter.apply(records))
    }
}
