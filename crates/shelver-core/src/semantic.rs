//! External semantic matcher contract.
//!
//! The embedding-based matcher is an external collaborator: given a
//! text blob and an owner id it returns the single best-matching
//! library, its score, and a list of alternates. This crate only
//! defines the contract; concrete implementations (HTTP client, a
//! disabled no-op) live in the application crate.
//!
//! Matcher results reference libraries by id only. All metadata is
//! resolved against the single per-audit snapshot of the owner's
//! libraries, so one audit can never mix a pre-change score with a
//! post-change name.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The matcher's own nominal acceptance threshold. Informational for
/// display only; the audit policy applies its own, separate threshold
/// ([`crate::audit::MINIMUM_MATCH_THRESHOLD`]).
pub const SEMANTIC_MATCH_THRESHOLD: f64 = 0.75;

/// Options passed with every matcher call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Minimum score below which the matcher reports no primary match.
    pub min_score: f64,
    /// Score every owned library, not just keyword pre-filtered ones.
    pub skip_keyword_filter: bool,
    /// Force embedding comparison even where the matcher would normally
    /// short-circuit, so stale caches cannot hide a library.
    pub force_embedding_match: bool,
}

impl MatchOptions {
    /// The options every audit uses: all owned libraries scoreable.
    pub fn for_audit(min_score: f64) -> Self {
        Self {
            min_score,
            skip_keyword_filter: true,
            force_embedding_match: true,
        }
    }
}

/// A non-primary candidate reported by the matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticAlternate {
    pub library_id: String,
    pub score: f64,
}

/// Matcher response for one text blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticResult {
    /// Whether a primary match cleared the matcher's `min_score`.
    pub matched: bool,
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub alternates: Vec<SemanticAlternate>,
}

/// Embedding-based library matcher.
///
/// Implementations must be `Send + Sync`. Calls may block on external
/// I/O and should be bounded by a timeout; on failure the audit
/// degrades to heuristic-only scoring rather than failing.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    /// Match `text` against the libraries owned by `owner_id`.
    async fn match_text(
        &self,
        text: &str,
        owner_id: &str,
        options: &MatchOptions,
    ) -> Result<SemanticResult>;
}
