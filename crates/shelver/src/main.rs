//! # Shelver CLI (`shelver`)
//!
//! Commands for database initialization, placement audits, bulk
//! reconciliation, document moves, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! shelver --config ./config/shelver.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelver init` | Create the SQLite database and run schema migrations |
//! | `shelver recheck <document-id> --owner <id>` | Audit one document's placement |
//! | `shelver bulk-recheck --owner <id> [--library <id>]` | Re-audit every auto-ingested document |
//! | `shelver move <document-id> <library-id> --owner <id>` | Relocate a document |
//! | `shelver serve` | Start the JSON HTTP server |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shelver::config::load_config;
use shelver::matcher_http::build_matcher;
use shelver::sqlite_store::SqliteStore;
use shelver::{db, migrate, server};
use shelver_core::audit;
use shelver_core::reconcile;
use shelver_core::relocate;
use shelver_core::semantic::MatchOptions;

/// Placement audit and reconciliation engine for user-owned knowledge
/// libraries.
#[derive(Parser)]
#[command(
    name = "shelver",
    about = "Placement audit and reconciliation for knowledge libraries",
    version,
    long_about = "Shelver scores documents against every library their owner has configured \
    (semantic embeddings where available, keyword/name/description heuristics always), flags \
    misplacements, routes unmatched documents to a per-owner Uncategorized library, and applies \
    moves atomically with the ingestion audit log."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelver.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (libraries, documents, ingestion_log). Idempotent.
    Init,

    /// Audit one document's placement.
    ///
    /// Scores the document against every library the owner has and
    /// prints the ranked candidates plus a suggestion when the document
    /// appears misplaced or matches nothing.
    Recheck {
        /// The document to audit.
        document_id: String,

        /// Owner account id.
        #[arg(long)]
        owner: String,
    },

    /// Re-audit every auto-ingested document, heuristic-only.
    ///
    /// Scans one library (with --library) or the whole account, and
    /// prints aggregate counts plus every flagged document. Never calls
    /// the semantic matcher.
    BulkRecheck {
        /// Owner account id.
        #[arg(long)]
        owner: String,

        /// Restrict the scan to one library.
        #[arg(long)]
        library: Option<String>,
    },

    /// Move a document into another library.
    ///
    /// Updates the document's placement and its most recent
    /// ingestion-log entry in one transaction.
    Move {
        /// The document to move.
        document_id: String,

        /// The destination library.
        library_id: String,

        /// Owner account id.
        #[arg(long)]
        owner: String,
    },

    /// Start the JSON HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config.db).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized at {}", config.db.path.display());
        }

        Commands::Recheck { document_id, owner } => {
            let pool = db::connect(&config.db).await?;
            let store = SqliteStore::new(pool);
            let matcher = build_matcher(&config.matcher)?;
            let options = MatchOptions::for_audit(config.matcher.min_score);

            let report =
                audit::recheck_document(&store, matcher.as_ref(), &document_id, &owner, &options)
                    .await?;
            print_audit_report(&report);
        }

        Commands::BulkRecheck { owner, library } => {
            let pool = db::connect(&config.db).await?;
            let store = SqliteStore::new(pool);

            let report = reconcile::bulk_recheck(&store, &owner, library.as_deref()).await?;
            print_reconcile_report(&report);
        }

        Commands::Move {
            document_id,
            library_id,
            owner,
        } => {
            let pool = db::connect(&config.db).await?;
            let store = SqliteStore::new(pool);

            let outcome = relocate::move_document(&store, &document_id, &library_id, &owner).await?;
            println!(
                "Moved document {} from library {} to \"{}\" ({})",
                outcome.id,
                outcome.previous_library_id,
                outcome.new_library_name,
                outcome.new_library_id
            );
        }

        Commands::Serve => {
            let pool = db::connect(&config.db).await?;
            migrate::run_migrations(&pool).await?;
            let store = Arc::new(SqliteStore::new(pool));
            let matcher: Arc<dyn shelver_core::semantic::SemanticMatcher> =
                Arc::from(build_matcher(&config.matcher)?);
            server::run_server(&config, store, matcher).await?;
        }
    }

    Ok(())
}

fn print_audit_report(report: &audit::AuditReport) {
    println!(
        "Document {} (\"{}\"), current library: {}",
        report.document.id, report.document.title, report.current_library.library_name
    );
    println!(
        "  status: {}",
        if report.no_match {
            "no match"
        } else if report.is_mismatched {
            "mismatched"
        } else {
            "correctly placed"
        }
    );
    println!("  candidates:");
    for candidate in &report.all_matches {
        let marker = if candidate.is_current_library { "*" } else { " " };
        let tag = match candidate.match_type {
            shelver_core::models::MatchType::Semantic => "semantic",
            shelver_core::models::MatchType::KeywordOnly => "keyword_only",
        };
        println!(
            "  {} {:>5.1}%  {} ({}) [{}]",
            marker,
            candidate.score * 100.0,
            candidate.library_name,
            candidate.library_id,
            tag
        );
        if !candidate.matched_keywords.is_empty() {
            println!("            keywords: {}", candidate.matched_keywords.join(", "));
        }
    }
    if let Some(suggestion) = &report.suggestion {
        println!("  suggestion: {}", suggestion);
    }
}

fn print_reconcile_report(report: &reconcile::ReconcileReport) {
    println!(
        "Checked {} documents: {} correct, {} mismatched, {} weak",
        report.total, report.correct, report.mismatched, report.weak_match
    );
    for suggestion in &report.suggestions {
        let reason = match suggestion.reason {
            reconcile::ReconcileReason::KeywordMismatch => "keyword_mismatch",
            reconcile::ReconcileReason::BetterMatchFound => "better_match_found",
            reconcile::ReconcileReason::WeakOriginalMatch => "weak_original_match",
        };
        match (&suggestion.suggested_library_name, suggestion.suggested_score) {
            (Some(name), Some(score)) => println!(
                "  {} (\"{}\"): {}, {} at {:.1}% vs current {:.1}%",
                suggestion.document_id,
                suggestion.document_title,
                reason,
                name,
                score * 100.0,
                suggestion.current_score * 100.0
            ),
            _ => println!(
                "  {} (\"{}\"): {}, ingested at {:.1}% confidence, review manually",
                suggestion.document_id,
                suggestion.document_title,
                reason,
                suggestion.original_match_score * 100.0
            ),
        }
    }
}
