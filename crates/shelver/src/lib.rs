//! # Shelver
//!
//! **Placement audit and reconciliation engine for user-owned knowledge
//! libraries.**
//!
//! Documents are ingested into libraries by an external pipeline;
//! Shelver answers the question that pipeline cannot: *is each document
//! still in the right library?* It scores every document against every
//! library the owner has (semantic embedding score where a matcher
//! service is configured, keyword/name/description heuristics always),
//! flags mismatches with hysteresis so near-ties never thrash, routes
//! hopeless documents to a lazily created per-owner "Uncategorized"
//! library, and applies suggested moves atomically with the ingestion
//! audit log.
//!
//! ## Data Flow
//!
//! 1. A recheck request arrives (CLI or HTTP), carrying the owner id.
//! 2. The engine ([`shelver_core::audit`]) reads one snapshot of the
//!    owner's libraries from the [`sqlite_store`], consults the
//!    configured semantic matcher ([`matcher_http`]), and aggregates a
//!    ranked candidate list.
//! 3. The decision policy classifies the placement and, where needed,
//!    resolves the catch-all library and produces a suggestion.
//! 4. Moves are a separate, explicit operation
//!    ([`shelver_core::relocate`]) applied in one SQLite transaction.
//!
//! Bulk rechecks ([`shelver_core::reconcile`]) repeat the policy
//! heuristic-only across everything the ingestion log marks as
//! auto-ingested, so scanning a whole account never pays
//! embedding-provider cost.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | `LibraryStore` implementation over SQLite |
//! | [`matcher_http`] | Semantic matcher clients: HTTP and disabled |
//! | [`server`] | JSON HTTP API (Axum) with CORS |

pub mod config;
pub mod db;
pub mod matcher_http;
pub mod migrate;
pub mod server;
pub mod sqlite_store;

pub use shelver_core::{aggregate, audit, heuristic, models, reconcile, relocate, semantic, store, uncategorized};
