//! Lazy per-owner "Uncategorized" catch-all library.
//!
//! Created on first need, never duplicated: the store's
//! `(owner_id, name)` uniqueness constraint serializes concurrent
//! creators, and the loser of that race re-reads the winner's row.
//! This is an idempotent get-or-create backed by the constraint, not an
//! in-process singleton, so it stays correct across service instances.

use anyhow::Result;
use uuid::Uuid;

use crate::error::AuditError;
use crate::models::Library;
use crate::store::LibraryStore;

/// Name of the per-owner catch-all library. At most one library with
/// this name exists per owner.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Fixed blurb the catch-all is created with.
pub const UNCATEGORIZED_DESCRIPTION: &str =
    "Documents that did not match any of your libraries well. \
     Review these and move them once a better home exists.";

/// Return the owner's catch-all library, creating it on first need.
///
/// Created with empty keywords and auto-ingest disabled, so it never
/// competes in scoring and never attracts documents on its own.
pub async fn get_or_create<S: LibraryStore + ?Sized>(store: &S, owner_id: &str) -> Result<Library> {
    if let Some(existing) = store.find_library_by_name(owner_id, UNCATEGORIZED_NAME).await? {
        return Ok(existing);
    }

    let library = Library {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: UNCATEGORIZED_NAME.to_string(),
        description: UNCATEGORIZED_DESCRIPTION.to_string(),
        keywords: Vec::new(),
        auto_ingest_enabled: false,
    };

    match store.create_library(&library).await {
        Ok(created) => Ok(created),
        Err(err) => {
            // A concurrent caller won the race between lookup and insert.
            let lost_race = err
                .downcast_ref::<AuditError>()
                .is_some_and(|e| matches!(e, AuditError::PersistenceConflict(_)));
            if lost_race {
                if let Some(existing) =
                    store.find_library_by_name(owner_id, UNCATEGORIZED_NAME).await?
                {
                    return Ok(existing);
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_created_on_first_need() {
        let store = InMemoryStore::new();
        let lib = get_or_create(&store, "owner-1").await.unwrap();
        assert_eq!(lib.name, UNCATEGORIZED_NAME);
        assert_eq!(lib.owner_id, "owner-1");
        assert!(lib.keywords.is_empty());
        assert!(!lib.auto_ingest_enabled);
        assert_eq!(store.library_count(), 1);
    }

    #[tokio::test]
    async fn test_idempotent_across_calls() {
        let store = InMemoryStore::new();
        let first = get_or_create(&store, "owner-1").await.unwrap();
        let second = get_or_create(&store, "owner-1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.library_count(), 1);
    }

    #[tokio::test]
    async fn test_separate_per_owner() {
        let store = InMemoryStore::new();
        let a = get_or_create(&store, "owner-a").await.unwrap();
        let b = get_or_create(&store, "owner-b").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.library_count(), 2);
    }

    #[tokio::test]
    async fn test_recovers_when_losing_the_creation_race() {
        use std::sync::atomic::{AtomicBool, Ordering};

        use async_trait::async_trait;
        use crate::models::Document;
        use crate::store::{IngestedDocument, LibraryStore};

        // Delegating store whose first name lookup misses, simulating a
        // concurrent creator winning between lookup and insert.
        struct RacingStore {
            inner: InMemoryStore,
            first_lookup: AtomicBool,
        }

        #[async_trait]
        impl LibraryStore for RacingStore {
            async fn get_library(&self, id: &str) -> anyhow::Result<Option<Library>> {
                self.inner.get_library(id).await
            }
            async fn list_libraries(&self, owner_id: &str) -> anyhow::Result<Vec<Library>> {
                self.inner.list_libraries(owner_id).await
            }
            async fn find_library_by_name(
                &self,
                owner_id: &str,
                name: &str,
            ) -> anyhow::Result<Option<Library>> {
                if self.first_lookup.swap(false, Ordering::SeqCst) {
                    return Ok(None);
                }
                self.inner.find_library_by_name(owner_id, name).await
            }
            async fn create_library(&self, library: &Library) -> anyhow::Result<Library> {
                self.inner.create_library(library).await
            }
            async fn get_document(&self, id: &str) -> anyhow::Result<Option<Document>> {
                self.inner.get_document(id).await
            }
            async fn list_auto_ingested(
                &self,
                owner_id: &str,
                library_id: Option<&str>,
            ) -> anyhow::Result<Vec<IngestedDocument>> {
                self.inner.list_auto_ingested(owner_id, library_id).await
            }
            async fn relocate_document(
                &self,
                document_id: &str,
                target_library_id: &str,
            ) -> anyhow::Result<()> {
                self.inner.relocate_document(document_id, target_library_id).await
            }
        }

        let store = RacingStore {
            inner: InMemoryStore::new(),
            first_lookup: AtomicBool::new(true),
        };
        store.inner.insert_library(Library {
            id: "winner".to_string(),
            owner_id: "owner-1".to_string(),
            name: UNCATEGORIZED_NAME.to_string(),
            description: UNCATEGORIZED_DESCRIPTION.to_string(),
            keywords: Vec::new(),
            auto_ingest_enabled: false,
        });

        // Lookup misses, insert conflicts, recovery re-reads the winner.
        let lib = get_or_create(&store, "owner-1").await.unwrap();
        assert_eq!(lib.id, "winner");
        assert_eq!(store.inner.library_count(), 1);
    }
}
