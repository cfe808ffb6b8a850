//! Typed error taxonomy for audit, reconciliation, and relocation.
//!
//! Functions in this crate return `anyhow::Result`; errors that callers
//! need to distinguish are raised as [`AuditError`] values inside the
//! `anyhow` chain and recovered with `downcast_ref` at the transport
//! boundary (HTTP status mapping, CLI exit messages).

use thiserror::Error;

/// Errors a caller can act on.
///
/// Everything else (storage failures, serialization bugs) stays an
/// opaque `anyhow::Error` and surfaces as an internal error.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Document or library absent, or not owned by the caller.
    /// Ownership failures deliberately use this variant so that the
    /// existence of other users' resources is never revealed.
    #[error("{0} not found")]
    NotFound(String),

    /// A required field was missing or malformed. Client error, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The semantic matcher timed out or failed. Audits recover from
    /// this internally by degrading to heuristic-only scoring; it only
    /// escapes when a caller invokes the matcher directly.
    #[error("semantic matcher unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A concurrent writer modified the same rows. Retryable.
    #[error("conflicting concurrent update: {0}")]
    PersistenceConflict(String),
}

impl AuditError {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::NotFound(_) => "not_found",
            AuditError::InvalidArgument(_) => "bad_request",
            AuditError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuditError::PersistenceConflict(_) => "conflict",
        }
    }
}
