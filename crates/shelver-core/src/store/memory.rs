//! In-memory [`LibraryStore`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread
//! safety. The `(owner, name)` uniqueness constraint is enforced
//! in-process, and relocation holds both write locks for the duration
//! of the update so the two-row move is atomic to concurrent readers.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AuditError;
use crate::models::{Document, IngestionLogEntry, Library, AUTO_INGEST_SOURCE};

use super::{IngestedDocument, LibraryStore};

/// In-memory store. Libraries keep insertion order so that
/// `list_libraries` mirrors the creation-order contract of the SQLite
/// backend.
pub struct InMemoryStore {
    libraries: RwLock<Vec<Library>>,
    documents: RwLock<HashMap<String, Document>>,
    ingestion_log: RwLock<Vec<IngestionLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            libraries: RwLock::new(Vec::new()),
            documents: RwLock::new(HashMap::new()),
            ingestion_log: RwLock::new(Vec::new()),
        }
    }

    /// Seed a library without the uniqueness check, for test setup.
    pub fn insert_library(&self, library: Library) {
        self.libraries.write().unwrap().push(library);
    }

    /// Seed a document, for test setup.
    pub fn insert_document(&self, document: Document) {
        self.documents
            .write()
            .unwrap()
            .insert(document.id.clone(), document);
    }

    /// Seed an ingestion-log entry, for test setup.
    pub fn append_log_entry(&self, entry: IngestionLogEntry) {
        self.ingestion_log.write().unwrap().push(entry);
    }

    /// Number of libraries across all owners, for idempotence assertions.
    pub fn library_count(&self) -> usize {
        self.libraries.read().unwrap().len()
    }

    /// The latest ingestion-log entry for a document, for assertions.
    pub fn latest_log_entry(&self, document_id: &str) -> Option<IngestionLogEntry> {
        let log = self.ingestion_log.read().unwrap();
        log.iter()
            .filter(|e| e.document_id == document_id)
            .max_by_key(|e| e.created_at)
            .cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryStore for InMemoryStore {
    async fn get_library(&self, id: &str) -> Result<Option<Library>> {
        let libraries = self.libraries.read().unwrap();
        Ok(libraries.iter().find(|l| l.id == id).cloned())
    }

    async fn list_libraries(&self, owner_id: &str) -> Result<Vec<Library>> {
        let libraries = self.libraries.read().unwrap();
        Ok(libraries
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_library_by_name(&self, owner_id: &str, name: &str) -> Result<Option<Library>> {
        let libraries = self.libraries.read().unwrap();
        Ok(libraries
            .iter()
            .find(|l| l.owner_id == owner_id && l.name == name)
            .cloned())
    }

    async fn create_library(&self, library: &Library) -> Result<Library> {
        let mut libraries = self.libraries.write().unwrap();
        if libraries
            .iter()
            .any(|l| l.owner_id == library.owner_id && l.name == library.name)
        {
            return Err(AuditError::PersistenceConflict(format!(
                "library named {:?} already exists for this owner",
                library.name
            ))
            .into());
        }
        libraries.push(library.clone());
        Ok(library.clone())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().unwrap();
        Ok(documents.get(id).cloned())
    }

    async fn list_auto_ingested(
        &self,
        owner_id: &str,
        library_id: Option<&str>,
    ) -> Result<Vec<IngestedDocument>> {
        let libraries = self.libraries.read().unwrap();
        let documents = self.documents.read().unwrap();
        let log = self.ingestion_log.read().unwrap();

        let owned: Vec<&str> = libraries
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.id.as_str())
            .collect();

        // Latest auto-ingest entry per document.
        let mut latest: HashMap<&str, &IngestionLogEntry> = HashMap::new();
        for entry in log.iter().filter(|e| e.source == AUTO_INGEST_SOURCE) {
            match latest.get(entry.document_id.as_str()) {
                Some(existing) if existing.created_at >= entry.created_at => {}
                _ => {
                    latest.insert(entry.document_id.as_str(), entry);
                }
            }
        }

        let mut results: Vec<IngestedDocument> = latest
            .values()
            .filter_map(|entry| {
                let document = documents.get(&entry.document_id)?;
                if !owned.contains(&document.library_id.as_str()) {
                    return None;
                }
                if let Some(filter) = library_id {
                    if document.library_id != filter {
                        return None;
                    }
                }
                Some(IngestedDocument {
                    document: document.clone(),
                    log: (*entry).clone(),
                })
            })
            .collect();

        results.sort_by_key(|r| r.document.created_at);
        Ok(results)
    }

    async fn relocate_document(&self, document_id: &str, target_library_id: &str) -> Result<()> {
        // Both locks held for the whole update: readers see neither
        // change or both.
        let mut documents = self.documents.write().unwrap();
        let mut log = self.ingestion_log.write().unwrap();

        let document = documents
            .get_mut(document_id)
            .ok_or_else(|| AuditError::NotFound(format!("document {}", document_id)))?;
        document.library_id = target_library_id.to_string();
        document.folder_id = None;

        if let Some(entry) = log
            .iter_mut()
            .filter(|e| e.document_id == document_id)
            .max_by_key(|e| e.created_at)
        {
            entry.library_id = target_library_id.to_string();
        }

        Ok(())
    }
}
