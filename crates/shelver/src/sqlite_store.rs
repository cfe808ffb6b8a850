//! SQLite-backed [`LibraryStore`] implementation.
//!
//! Keywords are persisted as a JSON array column (display order
//! preserved). Relocation runs as a single transaction so the document
//! row and its latest ingestion-log entry always move together.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use shelver_core::error::AuditError;
use shelver_core::models::{Document, IngestionLogEntry, Library, AUTO_INGEST_SOURCE};
use shelver_core::store::{IngestedDocument, LibraryStore};

/// SQLite implementation of the [`LibraryStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn library_from_row(row: &sqlx::sqlite::SqliteRow) -> Library {
    let keywords_json: String = row.get("keywords_json");
    let keywords: Vec<String> = serde_json::from_str(&keywords_json).unwrap_or_default();
    Library {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        keywords,
        auto_ingest_enabled: row.get::<i64, _>("auto_ingest_enabled") != 0,
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        library_id: row.get("library_id"),
        folder_id: row.get("folder_id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl LibraryStore for SqliteStore {
    async fn get_library(&self, id: &str) -> Result<Option<Library>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, description, keywords_json, auto_ingest_enabled
             FROM libraries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(library_from_row))
    }

    async fn list_libraries(&self, owner_id: &str) -> Result<Vec<Library>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, description, keywords_json, auto_ingest_enabled
             FROM libraries WHERE owner_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(library_from_row).collect())
    }

    async fn find_library_by_name(&self, owner_id: &str, name: &str) -> Result<Option<Library>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, description, keywords_json, auto_ingest_enabled
             FROM libraries WHERE owner_id = ? AND name = ?",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(library_from_row))
    }

    async fn create_library(&self, library: &Library) -> Result<Library> {
        let keywords_json = serde_json::to_string(&library.keywords)?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO libraries (id, owner_id, name, description, keywords_json,
                                   auto_ingest_enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&library.id)
        .bind(&library.owner_id)
        .bind(&library.name)
        .bind(&library.description)
        .bind(&keywords_json)
        .bind(library.auto_ingest_enabled as i64)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(library.clone()),
            Err(err) => {
                let unique_violation = err
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if unique_violation {
                    Err(AuditError::PersistenceConflict(format!(
                        "library named {:?} already exists for this owner",
                        library.name
                    ))
                    .into())
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, library_id, folder_id, title, content, created_at
             FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn list_auto_ingested(
        &self,
        owner_id: &str,
        library_id: Option<&str>,
    ) -> Result<Vec<IngestedDocument>> {
        // One row per document: its latest auto-ingest log entry.
        let base = r#"
            SELECT d.id, d.library_id, d.folder_id, d.title, d.content, d.created_at,
                   il.id AS log_id, il.library_id AS log_library_id, il.source,
                   il.original_match_score, il.created_at AS log_created_at
            FROM ingestion_log il
            JOIN documents d ON d.id = il.document_id
            JOIN libraries l ON l.id = d.library_id
            WHERE il.source = ?
              AND l.owner_id = ?
              AND il.id = (
                  SELECT id FROM ingestion_log
                  WHERE document_id = il.document_id AND source = il.source
                  ORDER BY created_at DESC, id DESC
                  LIMIT 1
              )
        "#;

        let rows = if let Some(lib_id) = library_id {
            sqlx::query(&format!(
                "{} AND d.library_id = ? ORDER BY d.created_at ASC, d.id ASC",
                base
            ))
                .bind(AUTO_INGEST_SOURCE)
                .bind(owner_id)
                .bind(lib_id)
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query(&format!("{} ORDER BY d.created_at ASC, d.id ASC", base))
                .bind(AUTO_INGEST_SOURCE)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows
            .iter()
            .map(|row| IngestedDocument {
                document: document_from_row(row),
                log: IngestionLogEntry {
                    id: row.get("log_id"),
                    document_id: row.get("id"),
                    library_id: row.get("log_library_id"),
                    source: row.get("source"),
                    original_match_score: row.get("original_match_score"),
                    created_at: row.get("log_created_at"),
                },
            })
            .collect())
    }

    async fn relocate_document(&self, document_id: &str, target_library_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE documents SET library_id = ?, folder_id = NULL WHERE id = ?",
        )
        .bind(target_library_id)
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls back.
            return Err(AuditError::NotFound(format!("document {}", document_id)).into());
        }

        sqlx::query(
            r#"
            UPDATE ingestion_log SET library_id = ?
            WHERE id = (
                SELECT id FROM ingestion_log
                WHERE document_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            "#,
        )
        .bind(target_library_id)
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
