//! Core data models for the placement audit engine.
//!
//! Libraries and documents are created and destroyed by collaborators
//! outside this crate; the only field the engine ever mutates is a
//! document's placement (`library_id`, plus the matching field on its
//! most recent ingestion-log entry).

use serde::{Deserialize, Serialize};

/// `IngestionLogEntry::source` value written by the automatic ingestion
/// pipeline. Bulk reconciliation only considers these entries.
pub const AUTO_INGEST_SOURCE: &str = "auto";

/// A user-defined bucket of documents with matching metadata.
///
/// Keywords are matched case-insensitively as substrings of document
/// text; their order is irrelevant for matching but preserved for
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub auto_ingest_enabled: bool,
}

/// A stored document. `library_id` is the current placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub library_id: String,
    /// Folder within the library. Folder structure is library-scoped,
    /// so any cross-library move clears this.
    pub folder_id: Option<String>,
    pub title: String,
    pub content: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// Immutable record of how a document was filed at ingestion time.
///
/// Append-only; only `library_id` is ever rewritten, when the document
/// is relocated, so that audit history stays consistent with current
/// placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionLogEntry {
    pub id: String,
    pub document_id: String,
    pub library_id: String,
    pub source: String,
    /// Semantic score recorded when the document was first filed, in `[0, 1]`.
    pub original_match_score: f64,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// How a candidate's score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Scored by the external embedding matcher.
    Semantic,
    /// Scored purely by the keyword/name/description heuristic.
    KeywordOnly,
}

/// One library's ranked affinity to a document, as computed during an
/// audit. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub library_id: String,
    pub library_name: String,
    /// Always in `[0, 1]`.
    pub score: f64,
    /// Library keywords found verbatim in the document text, original
    /// casing and insertion order preserved.
    pub matched_keywords: Vec<String>,
    pub match_type: MatchType,
    pub is_current_library: bool,
}
