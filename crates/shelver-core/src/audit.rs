//! Single-document placement audit.
//!
//! Fetches the document and one snapshot of the owner's libraries,
//! scores every library (semantic where available, heuristic always),
//! and applies the decision policy: correctly placed, mismatched, or
//! matching nothing.
//!
//! # Decision Policy
//!
//! - `no_match`: the best candidate scores below
//!   [`MINIMUM_MATCH_THRESHOLD`]. The per-owner Uncategorized library is
//!   lazily resolved and suggested as the destination.
//! - `is_mismatched`: a different library beats the current one by more
//!   than [`SIGNIFICANT_GAP`]. The gap is hysteresis: near-tied
//!   libraries never cause move suggestions, so repeated audits cannot
//!   thrash a document back and forth.
//! - A document sitting in Uncategorized while a real match exists is
//!   suggested out, even when the gap is small.
//!
//! The semantic matcher is optional at runtime: on timeout or error the
//! audit logs a warning and degrades to heuristic-only scoring. An
//! audit never fails because the matcher did.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::aggregate::build_candidates;
use crate::error::AuditError;
use crate::models::{Candidate, Library};
use crate::semantic::{MatchOptions, SemanticMatcher, SEMANTIC_MATCH_THRESHOLD};
use crate::store::LibraryStore;
use crate::uncategorized::{self, UNCATEGORIZED_NAME};

/// Below this score a library is not considered a real match.
pub const MINIMUM_MATCH_THRESHOLD: f64 = 0.20;

/// Minimum score advantage another library must have over the current
/// one before a move is recommended.
pub const SIGNIFICANT_GAP: f64 = 0.10;

/// Reported in every audit response.
pub const MATCHING_ALGORITHM: &str = "semantic+keywords";

/// Characters of document content echoed back in the response.
const CONTENT_PREVIEW_CHARS: usize = 240;

/// Document identity echoed back with the audit result.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub content_preview: String,
    pub current_library_id: String,
}

/// Result of a single-document audit.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub document: DocumentSummary,
    pub current_library: Candidate,
    pub best_match: Candidate,
    pub is_mismatched: bool,
    pub no_match: bool,
    /// Present when the audit had to resolve the catch-all library.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncategorized_library: Option<Library>,
    pub minimum_threshold: f64,
    pub semantic_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub all_matches: Vec<Candidate>,
    pub matching_algorithm: &'static str,
}

/// Pure outcome of the decision policy, before any storage side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementDecision {
    pub is_mismatched: bool,
    pub no_match: bool,
    /// The caller should resolve/create the catch-all and suggest it.
    pub needs_uncategorized: bool,
    pub suggestion: Option<String>,
}

/// Apply the decision policy to a sorted candidate list.
///
/// `candidates` must be the output of
/// [`build_candidates`](crate::aggregate::build_candidates): sorted
/// descending, current library present.
pub fn decide(candidates: &[Candidate], current_is_uncategorized: bool) -> PlacementDecision {
    let best = match candidates.first() {
        Some(best) => best,
        None => {
            return PlacementDecision {
                is_mismatched: false,
                no_match: true,
                needs_uncategorized: !current_is_uncategorized,
                suggestion: None,
            }
        }
    };

    let current_score = candidates
        .iter()
        .find(|c| c.is_current_library)
        .map(|c| c.score)
        .unwrap_or(0.0);

    let above_threshold = best.score >= MINIMUM_MATCH_THRESHOLD;
    let no_match = !above_threshold;
    let is_mismatched = above_threshold
        && !best.is_current_library
        && (best.score - current_score) > SIGNIFICANT_GAP;

    let suggestion = if no_match && !current_is_uncategorized {
        Some(format!(
            "No library matches this document well (best: \"{}\" at {:.0}%). \
             Consider moving it to \"{}\".",
            best.library_name,
            best.score * 100.0,
            UNCATEGORIZED_NAME
        ))
    } else if is_mismatched {
        Some(format!(
            "\"{}\" scores {:.0}% against this document, versus {:.0}% for its \
             current library. Consider moving it to \"{}\".",
            best.library_name,
            best.score * 100.0,
            current_score * 100.0,
            best.library_name
        ))
    } else if current_is_uncategorized && above_threshold && !best.is_current_library {
        Some(format!(
            "This document now matches \"{}\" ({:.0}%). Consider moving it out of \"{}\".",
            best.library_name,
            best.score * 100.0,
            UNCATEGORIZED_NAME
        ))
    } else {
        None
    };

    PlacementDecision {
        is_mismatched,
        no_match,
        needs_uncategorized: no_match && !current_is_uncategorized,
        suggestion,
    }
}

/// Audit one document's placement.
///
/// Reads the owner's libraries exactly once; that snapshot supplies all
/// metadata for scoring and display. The semantic matcher is consulted
/// with `options` (see [`MatchOptions::for_audit`]); any matcher error
/// degrades the audit to heuristic-only scoring.
pub async fn recheck_document<S, M>(
    store: &S,
    matcher: &M,
    document_id: &str,
    owner_id: &str,
    options: &MatchOptions,
) -> Result<AuditReport>
where
    S: LibraryStore + ?Sized,
    M: SemanticMatcher + ?Sized,
{
    let document = store
        .get_document(document_id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("document {}", document_id)))?;

    let libraries = store.list_libraries(owner_id).await?;
    let current = libraries
        .iter()
        .find(|l| l.id == document.library_id)
        .ok_or_else(|| AuditError::NotFound(format!("document {}", document_id)))?;

    let text = format!("{}\n{}", document.title, document.content);
    let text_lower = text.to_lowercase();

    let semantic = match matcher.match_text(&text, owner_id, options).await {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!(
                document_id,
                error = %err,
                "semantic matcher unavailable, falling back to heuristic-only scoring"
            );
            None
        }
    };

    let candidates = build_candidates(
        &text_lower,
        &libraries,
        &document.library_id,
        semantic.as_ref(),
    );

    let current_candidate = candidates
        .iter()
        .find(|c| c.is_current_library)
        .cloned()
        .ok_or_else(|| anyhow!("current library missing from candidate list"))?;
    let best_match = candidates[0].clone();

    let decision = decide(&candidates, current.name == UNCATEGORIZED_NAME);

    let uncategorized_library = if decision.needs_uncategorized {
        Some(uncategorized::get_or_create(store, owner_id).await?)
    } else {
        None
    };

    Ok(AuditReport {
        document: DocumentSummary {
            id: document.id.clone(),
            title: document.title.clone(),
            content_preview: document.content.chars().take(CONTENT_PREVIEW_CHARS).collect(),
            current_library_id: document.library_id.clone(),
        },
        current_library: current_candidate,
        best_match,
        is_mismatched: decision.is_mismatched,
        no_match: decision.no_match,
        uncategorized_library,
        minimum_threshold: MINIMUM_MATCH_THRESHOLD,
        semantic_threshold: SEMANTIC_MATCH_THRESHOLD,
        suggestion: decision.suggestion,
        all_matches: candidates,
        matching_algorithm: MATCHING_ALGORITHM,
    })
}
