use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use shelver::config::DbConfig;
use shelver::{db, migrate};

fn shelver_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelver");
    path
}

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let db_path = data_dir.join("shelver.sqlite");

    // Matcher section omitted: provider defaults to "disabled", so every
    // audit runs heuristic-only and the tests are fully offline.
    let config_content = format!(
        r#"[db]
path = "{}"

[server]
bind = "127.0.0.1:7799"
"#,
        db_path.display()
    );

    let config_path = config_dir.join("shelver.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, db_path)
}

async fn insert_library(
    pool: &sqlx::SqlitePool,
    id: &str,
    owner_id: &str,
    name: &str,
    description: &str,
    keywords: &[&str],
) {
    sqlx::query(
        "INSERT INTO libraries (id, owner_id, name, description, keywords_json,
                                auto_ingest_enabled, created_at)
         VALUES (?, ?, ?, ?, ?, 1, 1)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(serde_json::to_string(keywords).unwrap())
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_document(
    pool: &sqlx::SqlitePool,
    id: &str,
    library_id: &str,
    title: &str,
    content: &str,
    original_score: f64,
) {
    sqlx::query(
        "INSERT INTO documents (id, library_id, folder_id, title, content, created_at)
         VALUES (?, ?, NULL, ?, ?, 1)",
    )
    .bind(id)
    .bind(library_id)
    .bind(title)
    .bind(content)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO ingestion_log (id, document_id, library_id, source,
                                    original_match_score, created_at)
         VALUES (?, ?, ?, 'auto', ?, 1)",
    )
    .bind(format!("log-{}", id))
    .bind(id)
    .bind(library_id)
    .bind(original_score)
    .execute(pool)
    .await
    .unwrap();
}

/// Two libraries for owner-1 and three auto-ingested documents, all
/// initially filed under the Rust library: one that belongs there, one
/// that reads like machine-learning material, and one matching nothing.
fn seed(db_path: &Path) {
    block_on(async {
        let pool = db::connect(&DbConfig {
            path: db_path.to_path_buf(),
        })
        .await
        .unwrap();
        migrate::run_migrations(&pool).await.unwrap();

        insert_library(
            &pool,
            "lib-rust",
            "owner-1",
            "Rust Programming",
            "Notes on systems programming",
            &["rust", "cargo", "crates", "borrow"],
        )
        .await;
        insert_library(
            &pool,
            "lib-ml",
            "owner-1",
            "Machine Learning",
            "Neural network research",
            &["python", "pytorch", "training", "tensors"],
        )
        .await;

        insert_document(
            &pool,
            "doc-rust",
            "lib-rust",
            "Rust notes",
            "Learning rust and cargo. The borrow checker keeps crates honest.",
            0.88,
        )
        .await;
        insert_document(
            &pool,
            "doc-ml",
            "lib-rust",
            "Model training",
            "Training neural tensors with python and pytorch.",
            0.92,
        )
        .await;
        insert_document(
            &pool,
            "doc-none",
            "lib-rust",
            "Diary",
            "Quarterly birdwatching diary entry.",
            0.35,
        )
        .await;

        pool.close().await;
    });
}

fn run_shelver(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shelver_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shelver binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path, db_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelver(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(db_path.exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path, _db_path) = setup_test_env();

    let (_, _, success1) = run_shelver(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_shelver(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_recheck_correctly_placed_document() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, stderr, success) =
        run_shelver(&config_path, &["recheck", "doc-rust", "--owner", "owner-1"]);
    assert!(success, "recheck failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("correctly placed"));
    assert!(stdout.contains("Rust Programming"));
}

#[test]
fn test_recheck_flags_misplaced_document() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, _, success) =
        run_shelver(&config_path, &["recheck", "doc-ml", "--owner", "owner-1"]);
    assert!(success);
    assert!(stdout.contains("mismatched"));
    assert!(stdout.contains("suggestion:"));
    assert!(stdout.contains("Machine Learning"));
}

#[test]
fn test_recheck_no_match_suggests_uncategorized() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, _, success) =
        run_shelver(&config_path, &["recheck", "doc-none", "--owner", "owner-1"]);
    assert!(success);
    assert!(stdout.contains("no match"));
    assert!(stdout.contains("Uncategorized"));

    // A second run resolves the same catch-all instead of creating
    // another one.
    let (_, _, success2) =
        run_shelver(&config_path, &["recheck", "doc-none", "--owner", "owner-1"]);
    assert!(success2);

    let count = block_on(async {
        let pool = db::connect(&DbConfig {
            path: db_path.to_path_buf(),
        })
        .await
        .unwrap();
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM libraries WHERE owner_id = 'owner-1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        pool.close().await;
        count
    });
    assert_eq!(count, 3, "expected Rust + ML + one Uncategorized");
}

#[test]
fn test_recheck_unknown_document_fails() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (_, stderr, success) =
        run_shelver(&config_path, &["recheck", "ghost", "--owner", "owner-1"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_recheck_foreign_owner_sees_not_found() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (_, stderr, success) =
        run_shelver(&config_path, &["recheck", "doc-rust", "--owner", "owner-2"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_bulk_recheck_classifies_all_documents() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, stderr, success) =
        run_shelver(&config_path, &["bulk-recheck", "--owner", "owner-1"]);
    assert!(success, "bulk-recheck failed: stderr={}", stderr);
    assert!(stdout.contains("Checked 3 documents: 1 correct, 1 mismatched, 1 weak"));
    assert!(stdout.contains("better_match_found"));
    assert!(stdout.contains("weak_original_match"));
}

#[test]
fn test_bulk_recheck_scoped_to_library() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, _, success) = run_shelver(
        &config_path,
        &["bulk-recheck", "--owner", "owner-1", "--library", "lib-ml"],
    );
    assert!(success);
    // All three seeded documents sit in lib-rust.
    assert!(stdout.contains("Checked 0 documents"));

    let (stdout, _, success) = run_shelver(
        &config_path,
        &["bulk-recheck", "--owner", "owner-1", "--library", "lib-rust"],
    );
    assert!(success);
    assert!(stdout.contains("Checked 3 documents"));
}

#[test]
fn test_move_then_recheck_is_clean() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (stdout, stderr, success) = run_shelver(
        &config_path,
        &["move", "doc-ml", "lib-ml", "--owner", "owner-1"],
    );
    assert!(success, "move failed: stderr={}", stderr);
    assert!(stdout.contains("Moved document doc-ml"));
    assert!(stdout.contains("Machine Learning"));

    let (stdout, _, success) =
        run_shelver(&config_path, &["recheck", "doc-ml", "--owner", "owner-1"]);
    assert!(success);
    assert!(stdout.contains("correctly placed"));

    // The ingestion log moved with the document, so bulk recheck now
    // agrees with the placement.
    let (stdout, _, success) =
        run_shelver(&config_path, &["bulk-recheck", "--owner", "owner-1"]);
    assert!(success);
    assert!(stdout.contains("2 correct, 0 mismatched, 1 weak"));
}

#[test]
fn test_move_is_idempotent() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (_, _, success1) = run_shelver(
        &config_path,
        &["move", "doc-ml", "lib-ml", "--owner", "owner-1"],
    );
    assert!(success1);

    let (stdout, _, success2) = run_shelver(
        &config_path,
        &["move", "doc-ml", "lib-ml", "--owner", "owner-1"],
    );
    assert!(success2, "repeating a move must succeed");
    assert!(stdout.contains("Moved document doc-ml"));
}

#[test]
fn test_move_foreign_owner_fails() {
    let (_tmp, config_path, db_path) = setup_test_env();
    seed(&db_path);

    let (_, stderr, success) = run_shelver(
        &config_path,
        &["move", "doc-ml", "lib-ml", "--owner", "owner-2"],
    );
    assert!(!success);
    assert!(stderr.contains("not found"));
}
