//! SQLite-specific store behavior: constraint mapping, transactional
//! relocation, and ingestion-log queries that the in-memory store's
//! unit tests cannot exercise.

use sqlx::Row;
use tempfile::TempDir;

use shelver::config::DbConfig;
use shelver::matcher_http::DisabledMatcher;
use shelver::sqlite_store::SqliteStore;
use shelver::{db, migrate};
use shelver_core::audit;
use shelver_core::error::AuditError;
use shelver_core::models::Library;
use shelver_core::semantic::{MatchOptions, SEMANTIC_MATCH_THRESHOLD};
use shelver_core::store::LibraryStore;
use shelver_core::uncategorized;

async fn test_store() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let pool = db::connect(&DbConfig {
        path: tmp.path().join("shelver.sqlite"),
    })
    .await
    .unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (tmp, SqliteStore::new(pool))
}

fn library(id: &str, owner_id: &str, name: &str, keywords: &[&str]) -> Library {
    Library {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        description: String::new(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        auto_ingest_enabled: true,
    }
}

async fn insert_document(
    store: &SqliteStore,
    id: &str,
    library_id: &str,
    folder_id: Option<&str>,
    content: &str,
) {
    sqlx::query(
        "INSERT INTO documents (id, library_id, folder_id, title, content, created_at)
         VALUES (?, ?, ?, 'untitled', ?, 1)",
    )
    .bind(id)
    .bind(library_id)
    .bind(folder_id)
    .bind(content)
    .execute(store.pool())
    .await
    .unwrap();
}

async fn insert_log(
    store: &SqliteStore,
    id: &str,
    document_id: &str,
    library_id: &str,
    source: &str,
    score: f64,
    created_at: i64,
) {
    sqlx::query(
        "INSERT INTO ingestion_log (id, document_id, library_id, source,
                                    original_match_score, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(document_id)
    .bind(library_id)
    .bind(source)
    .bind(score)
    .bind(created_at)
    .execute(store.pool())
    .await
    .unwrap();
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (_tmp, store) = test_store().await;
    migrate::run_migrations(store.pool()).await.unwrap();
    migrate::run_migrations(store.pool()).await.unwrap();
}

#[tokio::test]
async fn test_library_round_trip_preserves_keyword_order() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("a", "owner-1", "Recipes", &["zebra", "apple", "mango"]))
        .await
        .unwrap();

    let fetched = store.get_library("a").await.unwrap().unwrap();
    assert_eq!(fetched.name, "Recipes");
    assert_eq!(fetched.keywords, vec!["zebra", "apple", "mango"]);
    assert!(fetched.auto_ingest_enabled);

    let by_name = store
        .find_library_by_name("owner-1", "Recipes")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, "a");
}

#[tokio::test]
async fn test_duplicate_library_name_is_a_conflict() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("a", "owner-1", "Recipes", &[]))
        .await
        .unwrap();

    let err = store
        .create_library(&library("b", "owner-1", "Recipes", &[]))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AuditError>(),
        Some(AuditError::PersistenceConflict(_))
    ));
}

#[tokio::test]
async fn test_same_name_under_different_owners_is_allowed() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("a", "owner-1", "Recipes", &[]))
        .await
        .unwrap();
    store
        .create_library(&library("b", "owner-2", "Recipes", &[]))
        .await
        .unwrap();

    assert_eq!(store.list_libraries("owner-1").await.unwrap().len(), 1);
    assert_eq!(store.list_libraries("owner-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_relocate_moves_document_and_latest_log_entry() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("src", "owner-1", "Source", &[]))
        .await
        .unwrap();
    store
        .create_library(&library("dst", "owner-1", "Destination", &[]))
        .await
        .unwrap();
    insert_document(&store, "doc-1", "src", Some("folder-9"), "content").await;
    insert_log(&store, "log-old", "doc-1", "src", "auto", 0.9, 1).await;
    insert_log(&store, "log-new", "doc-1", "src", "auto", 0.8, 5).await;

    store.relocate_document("doc-1", "dst").await.unwrap();

    let doc = store.get_document("doc-1").await.unwrap().unwrap();
    assert_eq!(doc.library_id, "dst");
    assert_eq!(doc.folder_id, None, "folder no longer applies after a move");

    // Only the latest log entry follows the document; history stays.
    let rows = sqlx::query("SELECT id, library_id FROM ingestion_log WHERE document_id = 'doc-1'")
        .fetch_all(store.pool())
        .await
        .unwrap();
    for row in rows {
        let id: String = row.get("id");
        let lib: String = row.get("library_id");
        match id.as_str() {
            "log-old" => assert_eq!(lib, "src"),
            "log-new" => assert_eq!(lib, "dst"),
            other => panic!("unexpected log row {}", other),
        }
    }
}

#[tokio::test]
async fn test_relocate_unknown_document_is_not_found() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("dst", "owner-1", "Destination", &[]))
        .await
        .unwrap();

    let err = store.relocate_document("ghost", "dst").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AuditError>(),
        Some(AuditError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_auto_ingested_picks_latest_entry_per_document() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("a", "owner-1", "Alpha", &[]))
        .await
        .unwrap();
    insert_document(&store, "doc-1", "a", None, "content").await;
    insert_log(&store, "log-1", "doc-1", "a", "auto", 0.5, 1).await;
    insert_log(&store, "log-2", "doc-1", "a", "auto", 0.9, 7).await;

    let entries = store.list_auto_ingested("owner-1", None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].log.id, "log-2");
    assert_eq!(entries[0].log.original_match_score, 0.9);
}

#[tokio::test]
async fn test_list_auto_ingested_filters_source_owner_and_library() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("a", "owner-1", "Alpha", &[]))
        .await
        .unwrap();
    store
        .create_library(&library("b", "owner-1", "Beta", &[]))
        .await
        .unwrap();
    store
        .create_library(&library("theirs", "owner-2", "Theirs", &[]))
        .await
        .unwrap();

    insert_document(&store, "doc-auto", "a", None, "content").await;
    insert_log(&store, "log-auto", "doc-auto", "a", "auto", 0.8, 1).await;

    insert_document(&store, "doc-manual", "a", None, "content").await;
    insert_log(&store, "log-manual", "doc-manual", "a", "manual", 0.8, 1).await;

    insert_document(&store, "doc-beta", "b", None, "content").await;
    insert_log(&store, "log-beta", "doc-beta", "b", "auto", 0.8, 1).await;

    insert_document(&store, "doc-foreign", "theirs", None, "content").await;
    insert_log(&store, "log-foreign", "doc-foreign", "theirs", "auto", 0.8, 1).await;

    let all = store.list_auto_ingested("owner-1", None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|e| e.document.id.as_str()).collect();
    assert_eq!(ids, vec!["doc-auto", "doc-beta"]);

    let scoped = store.list_auto_ingested("owner-1", Some("a")).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].document.id, "doc-auto");
}

#[tokio::test]
async fn test_uncategorized_get_or_create_survives_real_constraint() {
    let (_tmp, store) = test_store().await;

    let first = uncategorized::get_or_create(&store, "owner-1").await.unwrap();
    let second = uncategorized::get_or_create(&store, "owner-1").await.unwrap();
    assert_eq!(first.id, second.id);

    // The constraint is per owner.
    let other = uncategorized::get_or_create(&store, "owner-2").await.unwrap();
    assert_ne!(first.id, other.id);
}

#[tokio::test]
async fn test_recheck_over_sqlite_flags_misplaced_document() {
    let (_tmp, store) = test_store().await;
    store
        .create_library(&library("recipes", "owner-1", "Recipes", &["pasta", "oven"]))
        .await
        .unwrap();
    store
        .create_library(&library("taxes", "owner-1", "Taxes", &["invoice"]))
        .await
        .unwrap();
    insert_document(&store, "doc-1", "taxes", None, "pasta in the oven").await;

    let report = audit::recheck_document(
        &store,
        &DisabledMatcher,
        "doc-1",
        "owner-1",
        &MatchOptions::for_audit(SEMANTIC_MATCH_THRESHOLD),
    )
    .await
    .unwrap();

    assert!(report.is_mismatched);
    assert_eq!(report.best_match.library_id, "recipes");
    assert_eq!(report.best_match.matched_keywords, vec!["pasta", "oven"]);
    assert!(report.current_library.is_current_library);
}
