//! Candidate aggregation: one ranked, deduplicated list per audit.
//!
//! # Build Order
//!
//! 1. The semantic matcher's primary match, if any (`semantic`).
//! 2. Each semantic alternate, in reported order (`semantic`).
//! 3. Every remaining owned library, scored by the heuristic formula
//!    (`keyword_only`). Because this walks the full snapshot, the
//!    document's current library is always present in the output.
//!
//! Deduplication is by library id, first occurrence wins, so a semantic
//! score takes priority over the heuristic fallback for the same
//! library. The final sort is stable and descending by score; ties keep
//! insertion order.
//!
//! Semantic ids that do not resolve against the snapshot (library
//! deleted between the matcher call and the snapshot read) are skipped.

use std::collections::{HashMap, HashSet};

use crate::heuristic;
use crate::models::{Candidate, Library, MatchType};
use crate::semantic::SemanticResult;

/// Build the ranked candidate list for one document.
///
/// `libraries` is the owner's full library snapshot, read once per
/// audit. `semantic` is `None` when the matcher was unavailable; the
/// list is then heuristic-only.
pub fn build_candidates(
    text_lower: &str,
    libraries: &[Library],
    current_library_id: &str,
    semantic: Option<&SemanticResult>,
) -> Vec<Candidate> {
    let by_id: HashMap<&str, &Library> = libraries.iter().map(|l| (l.id.as_str(), l)).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    if let Some(sem) = semantic {
        if sem.matched {
            if let (Some(id), Some(score)) = (sem.library_id.as_deref(), sem.score) {
                if let Some(lib) = by_id.get(id) {
                    if seen.insert(lib.id.clone()) {
                        candidates.push(candidate_for(
                            lib,
                            text_lower,
                            score,
                            MatchType::Semantic,
                            current_library_id,
                        ));
                    }
                }
            }
        }
        for alt in &sem.alternates {
            if let Some(lib) = by_id.get(alt.library_id.as_str()) {
                if seen.insert(lib.id.clone()) {
                    candidates.push(candidate_for(
                        lib,
                        text_lower,
                        alt.score,
                        MatchType::Semantic,
                        current_library_id,
                    ));
                }
            }
        }
    }

    for lib in libraries {
        if seen.insert(lib.id.clone()) {
            let score = heuristic::score_library(text_lower, lib).combined();
            candidates.push(candidate_for(
                lib,
                text_lower,
                score,
                MatchType::KeywordOnly,
                current_library_id,
            ));
        }
    }

    // Stable sort: ties keep the insertion order above.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
}

/// Build one candidate, enriching it with the heuristic sub-scores
/// (matched keywords) for display regardless of where the score came
/// from.
fn candidate_for(
    library: &Library,
    text_lower: &str,
    score: f64,
    match_type: MatchType,
    current_library_id: &str,
) -> Candidate {
    let heuristic = heuristic::score_library(text_lower, library);
    Candidate {
        library_id: library.id.clone(),
        library_name: library.name.clone(),
        score: score.clamp(0.0, 1.0),
        matched_keywords: heuristic.matched_keywords,
        match_type,
        is_current_library: library.id == current_library_id,
    }
}
