//! Corpus-wide placement audit over previously auto-ingested documents.
//!
//! Bulk mode intentionally never calls the semantic matcher: rechecking
//! a whole library or account must stay fast and free of
//! embedding-provider cost and latency. Each document is rescored with
//! the heuristic formula against every owned library, and the score
//! recorded at ingestion time serves as an additional weak-match
//! signal.
//!
//! Classification per document:
//! - `mismatched`: a different library beats the current score by more
//!   than [`SIGNIFICANT_GAP`], or the current score fell below
//!   [`MINIMUM_MATCH_THRESHOLD`] while another library clears it;
//! - `weak_match`: placement still wins today, but the semantic score
//!   recorded at ingest was below [`WEAK_MATCH_THRESHOLD`]; flagged for
//!   manual review with no target library;
//! - `correct`: everything else.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use crate::audit::{MINIMUM_MATCH_THRESHOLD, SIGNIFICANT_GAP};
use crate::error::AuditError;
use crate::heuristic;
use crate::models::Library;
use crate::store::LibraryStore;

/// Documents whose ingestion-time semantic score fell below this are
/// flagged for review even when no better library exists today.
///
/// Deliberately separate from [`MINIMUM_MATCH_THRESHOLD`]: this one
/// judges the semantic score recorded at ingest, not the heuristic
/// recomputed now, and the two scales are not interchangeable.
pub const WEAK_MATCH_THRESHOLD: f64 = 0.60;

/// Why a document was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileReason {
    /// Current library below the minimum threshold while another clears it.
    KeywordMismatch,
    /// Another library beats the current score by more than the gap.
    BetterMatchFound,
    /// Weak semantic confidence recorded at ingestion time.
    WeakOriginalMatch,
}

/// One flagged document.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSuggestion {
    pub document_id: String,
    pub document_title: String,
    pub current_library_id: String,
    pub current_library_name: String,
    pub current_score: f64,
    /// Current library's keywords found in the document.
    pub current_keywords: Vec<String>,
    pub original_match_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_library_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_library_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_keywords: Option<Vec<String>>,
    pub reason: ReconcileReason,
}

/// The thresholds the run was judged against, echoed for display.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileThresholds {
    pub minimum_match: f64,
    pub significant_difference: f64,
    pub weak_match_threshold: f64,
}

/// Aggregate result of one bulk recheck.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub total: usize,
    pub correct: usize,
    pub mismatched: usize,
    pub weak_match: usize,
    pub suggestions: Vec<ReconcileSuggestion>,
    pub thresholds: ReconcileThresholds,
}

/// Re-audit every auto-ingested document in one library (or, with
/// `library_id = None`, across the whole account).
pub async fn bulk_recheck<S: LibraryStore + ?Sized>(
    store: &S,
    owner_id: &str,
    library_id: Option<&str>,
) -> Result<ReconcileReport> {
    if let Some(id) = library_id {
        let library = store
            .get_library(id)
            .await?
            .ok_or_else(|| AuditError::NotFound(format!("library {}", id)))?;
        if library.owner_id != owner_id {
            return Err(AuditError::NotFound(format!("library {}", id)).into());
        }
    }

    let libraries = store.list_libraries(owner_id).await?;
    let by_id: HashMap<&str, &Library> = libraries.iter().map(|l| (l.id.as_str(), l)).collect();

    let entries = store.list_auto_ingested(owner_id, library_id).await?;

    let mut correct = 0usize;
    let mut mismatched = 0usize;
    let mut weak_match = 0usize;
    let mut suggestions: Vec<ReconcileSuggestion> = Vec::new();

    for entry in &entries {
        let document = &entry.document;
        let text_lower = format!("{}\n{}", document.title, document.content).to_lowercase();

        let (current_score, current_keywords, current_name) =
            match by_id.get(document.library_id.as_str()) {
                Some(lib) => {
                    let score = heuristic::score_library(&text_lower, lib);
                    (score.combined(), score.matched_keywords, lib.name.clone())
                }
                // Current library deleted mid-flight: score it as zero
                // so the document surfaces rather than erroring the run.
                None => (0.0, Vec::new(), document.library_id.clone()),
            };

        // Best among the *other* libraries.
        let mut best: Option<(&Library, f64, Vec<String>)> = None;
        for lib in &libraries {
            if lib.id == document.library_id {
                continue;
            }
            let score = heuristic::score_library(&text_lower, lib);
            let combined = score.combined();
            if best.as_ref().map(|(_, s, _)| combined > *s).unwrap_or(true) {
                best = Some((lib, combined, score.matched_keywords));
            }
        }

        let has_better_match = best
            .as_ref()
            .map(|(_, score, _)| *score > current_score + SIGNIFICANT_GAP)
            .unwrap_or(false);
        let keyword_mismatch = best
            .as_ref()
            .map(|(_, score, _)| {
                current_score < MINIMUM_MATCH_THRESHOLD && *score >= MINIMUM_MATCH_THRESHOLD
            })
            .unwrap_or(false);

        if has_better_match || keyword_mismatch {
            mismatched += 1;
            let (lib, score, keywords) = best.expect("mismatch implies a best-other library");
            let reason = if has_better_match {
                ReconcileReason::BetterMatchFound
            } else {
                ReconcileReason::KeywordMismatch
            };
            tracing::debug!(
                document_id = %document.id,
                suggested = %lib.id,
                current_score,
                suggested_score = score,
                ?reason,
                "document flagged as mismatched"
            );
            suggestions.push(ReconcileSuggestion {
                document_id: document.id.clone(),
                document_title: document.title.clone(),
                current_library_id: document.library_id.clone(),
                current_library_name: current_name,
                current_score,
                current_keywords,
                original_match_score: entry.log.original_match_score,
                suggested_library_id: Some(lib.id.clone()),
                suggested_library_name: Some(lib.name.clone()),
                suggested_score: Some(score),
                suggested_keywords: Some(keywords),
                reason,
            });
        } else if entry.log.original_match_score < WEAK_MATCH_THRESHOLD {
            weak_match += 1;
            tracing::debug!(
                document_id = %document.id,
                original_match_score = entry.log.original_match_score,
                "document flagged for review: weak ingestion confidence"
            );
            suggestions.push(ReconcileSuggestion {
                document_id: document.id.clone(),
                document_title: document.title.clone(),
                current_library_id: document.library_id.clone(),
                current_library_name: current_name,
                current_score,
                current_keywords,
                original_match_score: entry.log.original_match_score,
                suggested_library_id: None,
                suggested_library_name: None,
                suggested_score: None,
                suggested_keywords: None,
                reason: ReconcileReason::WeakOriginalMatch,
            });
        } else {
            correct += 1;
        }
    }

    Ok(ReconcileReport {
        total: entries.len(),
        correct,
        mismatched,
        weak_match,
        suggestions,
        thresholds: ReconcileThresholds {
            minimum_match: MINIMUM_MATCH_THRESHOLD,
            significant_difference: SIGNIFICANT_GAP,
            weak_match_threshold: WEAK_MATCH_THRESHOLD,
        },
    })
}
