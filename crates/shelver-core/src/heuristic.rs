//! Weighted keyword/name/description scorer.
//!
//! Pure and deterministic: no I/O, no caching, cheap enough to run over
//! every library an owner has on every audit call. The caller lowercases
//! the document text once; all matching is case-insensitive substring
//! containment.
//!
//! # Scoring Formula
//!
//! `combined = 0.75 × keyword + 0.10 × name + 0.15 × description`
//!
//! The weights are fixed design constants: explicit keywords are the
//! most reliable signal, free-text descriptions next, and names least
//! (names are often generic).

use crate::models::Library;

/// Weight of the keyword sub-score in the combined heuristic.
pub const KEYWORD_WEIGHT: f64 = 0.75;
/// Weight of the library-name sub-score in the combined heuristic.
pub const NAME_WEIGHT: f64 = 0.10;
/// Weight of the description sub-score in the combined heuristic.
pub const DESCRIPTION_WEIGHT: f64 = 0.15;

/// Filler words excluded from description matching. Words of length
/// three or less are already excluded by the length cutoff.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "have", "are", "was", "were", "been",
    "being",
];

/// Sub-scores produced by [`score_library`]. Each is in `[0, 1]`;
/// a library with no usable signal scores `0.0`, never `NaN`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScore {
    /// Fraction of the library's keywords found in the document.
    pub keyword_score: f64,
    /// `1.0` for a verbatim name hit, else the fraction of name words
    /// (longer than 2 characters) found in the document.
    pub name_score: f64,
    /// Fraction of significant description words (longer than 3
    /// characters, stop words excluded) found in the document.
    pub description_score: f64,
    /// The keywords that matched, original casing, insertion order.
    pub matched_keywords: Vec<String>,
}

impl HeuristicScore {
    /// The weighted combination of the three sub-scores.
    pub fn combined(&self) -> f64 {
        KEYWORD_WEIGHT * self.keyword_score
            + NAME_WEIGHT * self.name_score
            + DESCRIPTION_WEIGHT * self.description_score
    }
}

/// Score one library's metadata against a document.
///
/// `text_lower` must already be lowercased; callers lowercase once and
/// reuse the same string across every library in the account.
pub fn score_library(text_lower: &str, library: &Library) -> HeuristicScore {
    let matched_keywords: Vec<String> = library
        .keywords
        .iter()
        .filter(|kw| !kw.is_empty() && text_lower.contains(&kw.to_lowercase()))
        .cloned()
        .collect();

    let keyword_score = if library.keywords.is_empty() {
        0.0
    } else {
        matched_keywords.len() as f64 / library.keywords.len() as f64
    };

    let name_lower = library.name.to_lowercase();
    let name_score = if !name_lower.trim().is_empty() && text_lower.contains(name_lower.trim()) {
        1.0
    } else {
        let words: Vec<&str> = name_lower
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .collect();
        if words.is_empty() {
            0.0
        } else {
            let hits = words.iter().filter(|w| text_lower.contains(*w)).count();
            hits as f64 / words.len() as f64
        }
    };

    let description_lower = library.description.to_lowercase();
    let significant: Vec<&str> = description_lower
        .split_whitespace()
        .filter(|w| w.len() > 3 && !STOP_WORDS.contains(w))
        .collect();
    let description_score = if significant.is_empty() {
        0.0
    } else {
        let hits = significant.iter().filter(|w| text_lower.contains(*w)).count();
        hits as f64 / significant.len() as f64
    };

    HeuristicScore {
        keyword_score,
        name_score,
        description_score,
        matched_keywords,
    }
}
