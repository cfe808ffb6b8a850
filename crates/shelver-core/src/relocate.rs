//! Audit-consistent document moves.
//!
//! Relocation is always an explicit operation, separate from the audit
//! that suggested it. The store applies the placement change and the
//! ingestion-log rewrite as one atomic unit
//! ([`LibraryStore::relocate_document`]); this module owns the
//! ownership checks and the response shape.

use anyhow::Result;
use serde::Serialize;

use crate::error::AuditError;
use crate::store::LibraryStore;

/// Result of a successful move.
#[derive(Debug, Clone, Serialize)]
pub struct RelocationOutcome {
    pub id: String,
    pub previous_library_id: String,
    pub new_library_id: String,
    pub new_library_name: String,
}

/// Move a document into `target_library_id`.
///
/// Fails with `NotFound` when the document or the target library does
/// not exist or is not owned by `owner_id`. Moving a document into the
/// library it already occupies succeeds and leaves state unchanged, so
/// retries are safe.
pub async fn move_document<S: LibraryStore + ?Sized>(
    store: &S,
    document_id: &str,
    target_library_id: &str,
    owner_id: &str,
) -> Result<RelocationOutcome> {
    if document_id.trim().is_empty() || target_library_id.trim().is_empty() {
        return Err(AuditError::InvalidArgument(
            "document_id and target_library_id are required".to_string(),
        )
        .into());
    }

    let document = store
        .get_document(document_id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("document {}", document_id)))?;

    let current = store
        .get_library(&document.library_id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("document {}", document_id)))?;
    if current.owner_id != owner_id {
        return Err(AuditError::NotFound(format!("document {}", document_id)).into());
    }

    let target = store
        .get_library(target_library_id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("library {}", target_library_id)))?;
    if target.owner_id != owner_id {
        return Err(AuditError::NotFound(format!("library {}", target_library_id)).into());
    }

    store
        .relocate_document(document_id, target_library_id)
        .await?;

    tracing::info!(
        document_id,
        from = %document.library_id,
        to = %target.id,
        "document relocated"
    );

    Ok(RelocationOutcome {
        id: document.id,
        previous_library_id: document.library_id,
        new_library_id: target.id,
        new_library_name: target.name,
    })
}
