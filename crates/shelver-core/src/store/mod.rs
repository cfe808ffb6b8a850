//! Storage abstraction for the placement audit engine.
//!
//! The [`LibraryStore`] trait defines every read and write the audit,
//! reconciliation, and relocation paths need, enabling pluggable
//! backends (SQLite in the application crate, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, IngestionLogEntry, Library};

/// A document joined with its most recent automatic ingestion-log
/// entry, as consumed by bulk reconciliation.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub document: Document,
    pub log: IngestionLogEntry,
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_library`](LibraryStore::get_library) | Fetch one library by id |
/// | [`list_libraries`](LibraryStore::list_libraries) | Snapshot of all libraries an owner has |
/// | [`find_library_by_name`](LibraryStore::find_library_by_name) | Exact-name lookup within an owner |
/// | [`create_library`](LibraryStore::create_library) | Insert a library, enforcing `(owner, name)` uniqueness |
/// | [`get_document`](LibraryStore::get_document) | Fetch one document by id |
/// | [`list_auto_ingested`](LibraryStore::list_auto_ingested) | Documents joined with their latest auto-ingest log entry |
/// | [`relocate_document`](LibraryStore::relocate_document) | Atomically move a document and rewrite its log entry |
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Fetch one library by id, regardless of owner. Callers are
    /// responsible for ownership checks.
    async fn get_library(&self, id: &str) -> Result<Option<Library>>;

    /// All libraries owned by `owner_id`, in creation order.
    ///
    /// Each audit reads this exactly once and treats it as its
    /// consistent snapshot; every full metadata record comes from here.
    async fn list_libraries(&self, owner_id: &str) -> Result<Vec<Library>>;

    /// Exact-name lookup within one owner's libraries.
    async fn find_library_by_name(&self, owner_id: &str, name: &str) -> Result<Option<Library>>;

    /// Insert a new library.
    ///
    /// Must enforce uniqueness of `(owner_id, name)` and surface a
    /// violation as [`crate::error::AuditError::PersistenceConflict`],
    /// so that concurrent get-or-create callers can recover.
    async fn create_library(&self, library: &Library) -> Result<Library>;

    /// Fetch one document by id.
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Every document of `owner_id` that was automatically ingested,
    /// joined with its most recent auto-ingest log entry. `library_id`
    /// narrows the scan to one library.
    async fn list_auto_ingested(
        &self,
        owner_id: &str,
        library_id: Option<&str>,
    ) -> Result<Vec<IngestedDocument>>;

    /// Move a document to `target_library_id`: set the document's
    /// placement, clear its folder assignment, and rewrite the most
    /// recent ingestion-log entry's `library_id`.
    ///
    /// The two updates must be applied as a single atomic unit; a
    /// concurrent reader must never observe one without the other.
    async fn relocate_document(&self, document_id: &str, target_library_id: &str) -> Result<()>;
}
