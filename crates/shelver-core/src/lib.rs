//! # Shelver Core
//!
//! Placement audit and reconciliation logic for user-owned knowledge
//! libraries: given a document and the set of libraries its owner has
//! configured (name, description, free-text keywords), decide which
//! library the document belongs to, whether it is misplaced, and what
//! to do about documents that match nothing.
//!
//! This crate is pure domain logic. It performs no I/O of its own:
//! storage is reached through the [`store::LibraryStore`] trait and the
//! embedding-based matcher through the [`semantic::SemanticMatcher`]
//! trait, both implemented by the application crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types: `Library`, `Document`, `IngestionLogEntry`, `Candidate` |
//! | [`heuristic`] | Weighted keyword/name/description scorer |
//! | [`semantic`] | External semantic matcher contract |
//! | [`aggregate`] | Merge semantic and heuristic signals into one ranked candidate list |
//! | [`audit`] | Single-document placement audit and decision policy |
//! | [`reconcile`] | Corpus-wide, heuristic-only placement audit |
//! | [`uncategorized`] | Lazy per-owner "Uncategorized" catch-all library |
//! | [`relocate`] | Audit-consistent document moves |
//! | [`store`] | Storage abstraction plus an in-memory implementation |
//! | [`error`] | Typed error taxonomy carried inside `anyhow` chains |

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod heuristic;
pub mod models;
pub mod reconcile;
pub mod relocate;
pub mod semantic;
pub mod store;
pub mod uncategorized;
