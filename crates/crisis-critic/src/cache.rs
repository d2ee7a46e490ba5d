//! Compliance judgement cache using moka
//!
//! Semantic judges are slow, so judgements are memoized under a blake3 digest
//! of every input a judge sees: standard, phase, content, technical metadata
//! and scenario context.

use crate::framework::ComplianceJudgement;
use crisis_scenario::{ComplianceStandard, CrisisPhase, TechnicalMetadata};
use moka::future::Cache;

/// Default maximum number of cached judgements
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Digest identifying one judgement input
pub type JudgementKey = blake3::Hash;

/// Process-scoped judgement cache
#[derive(Debug, Clone)]
pub struct ComplianceCache {
    inner: Cache<JudgementKey, ComplianceJudgement>,
}

impl ComplianceCache {
    /// Create cache holding at most `max_capacity` judgements
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Key for one framework call
    #[must_use]
    pub fn key(
        standard: ComplianceStandard,
        phase: CrisisPhase,
        content: &str,
        metadata: &TechnicalMetadata,
        context: Option<&str>,
    ) -> JudgementKey {
        let mut hasher = blake3::Hasher::new();
        hasher.update(standard.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(phase.as_str().as_bytes());
        hasher.update(b"|");
        // length prefix keeps content from bleeding into the fields after it
        hasher.update(&(content.len() as u64).to_le_bytes());
        hasher.update(content.as_bytes());
        hasher.update(&serde_json::to_vec(metadata).unwrap_or_default());
        hasher.update(b"|");
        match context {
            Some(ctx) => {
                hasher.update(b"1");
                hasher.update(ctx.as_bytes());
            }
            None => {
                hasher.update(b"0");
            }
        }
        hasher.finalize()
    }

    /// Cached judgement
    pub async fn get(&self, key: &JudgementKey) -> Option<ComplianceJudgement> {
        self.inner.get(key).await
    }

    /// Store a judgement
    pub async fn insert(&self, key: JudgementKey, judgement: ComplianceJudgement) {
        self.inner.insert(key, judgement).await;
    }

    /// Drop every cached judgement
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for ComplianceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::JudgementSource;

    #[test]
    fn key_separates_every_input() {
        use crisis_graph::EntityStatus;

        let meta = TechnicalMetadata::default();
        let key = |standard, phase, content: &str, meta: &TechnicalMetadata, ctx| {
            ComplianceCache::key(standard, phase, content, meta, ctx)
        };
        let base = key(ComplianceStandard::Dora, CrisisPhase::Recovery, "x", &meta, None);

        assert_eq!(base, key(ComplianceStandard::Dora, CrisisPhase::Recovery, "x", &meta, None));
        assert_ne!(base, key(ComplianceStandard::NistCsf, CrisisPhase::Recovery, "x", &meta, None));
        assert_ne!(base, key(ComplianceStandard::Dora, CrisisPhase::Containment, "x", &meta, None));
        assert_ne!(base, key(ComplianceStandard::Dora, CrisisPhase::Recovery, "y", &meta, None));
        assert_ne!(
            base,
            key(ComplianceStandard::Dora, CrisisPhase::Recovery, "x", &meta, Some("ransomware"))
        );

        let mut effects = TechnicalMetadata::default();
        effects.status_effects.insert("DB-01".into(), EntityStatus::Online);
        assert_ne!(base, key(ComplianceStandard::Dora, CrisisPhase::Recovery, "x", &effects, None));
    }

    #[tokio::test]
    async fn insert_get_invalidate() {
        let cache = ComplianceCache::new(10);
        let key = ComplianceCache::key(
            ComplianceStandard::Iso27001,
            CrisisPhase::Containment,
            "c",
            &TechnicalMetadata::default(),
            None,
        );
        let judgement = ComplianceJudgement {
            compliant: true,
            met: vec!["A.5.26".into()],
            missing: vec![],
            warnings: vec![],
            source: JudgementSource::Heuristic,
        };

        assert!(cache.get(&key).await.is_none());
        cache.insert(key, judgement.clone()).await;
        assert_eq!(cache.get(&key).await, Some(judgement));

        cache.invalidate_all();
        assert!(cache.get(&key).await.is_none());
    }
}
