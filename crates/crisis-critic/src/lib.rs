//! Crisis Critic - acceptance gate for drafted injects
//!
//! Checks, all independent, all required for acceptance:
//! - Structure: length, referential integrity, ordering, id uniqueness
//! - Causality: no asset is affected without a causal precedent
//! - State consistency: no repeated initial compromise, no early restoration
//! - Compliance-tag grounding against a category keyword table
//! - Mandatory requirements of the active standard, via a compliance framework
//!
//! # Example
//!
//! ```rust,ignore
//! use crisis_critic::{Critic, CriticConfig};
//!
//! let critic = Critic::new(store, CriticConfig::default());
//! let verdict = critic.validate(&draft, &state).await?;
//! if !verdict.accepted {
//!     for line in verdict.error_messages() {
//!         eprintln!("{line}");
//!     }
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod causality;
pub mod consistency;
pub mod critic;
pub mod error;
pub mod framework;
pub mod structure;
pub mod tags;
pub mod verdict;

pub use cache::ComplianceCache;
pub use consistency::claims_initial_compromise;
pub use critic::{Critic, CriticConfig, DEFAULT_MIN_CONTENT_LENGTH};
pub use error::CriticError;
pub use framework::{
    CatalogFramework, ComplianceFramework, ComplianceJudgement, JudgeResponse, JudgementSource,
    Requirement, SemanticJudge,
};
pub use tags::TagCategory;
pub use verdict::{CheckKind, CriticVerdict, Finding, Precedent, Severity, VerdictDetails};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
