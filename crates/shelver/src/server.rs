//! HTTP API server.
//!
//! Exposes the audit, bulk-recheck, and relocation operations over
//! JSON HTTP. Caller identity is the `X-Owner-Id` header; every lookup
//! is scoped to that owner, and foreign resources answer 404.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/documents/{id}/recheck` | Audit one document's placement |
//! | `POST` | `/recheck` | Bulk recheck a library (`{"library_id": ...}`) or the whole account (`{}`) |
//! | `POST` | `/documents/{id}/move` | Relocate a document (`{"target_library_id": ...}`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document 42 not found" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict`
//! (409, retryable), `upstream_unavailable` (502), `internal` (500).
//! Internal failures never return partial audit bodies.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use shelver_core::audit;
use shelver_core::error::AuditError;
use shelver_core::reconcile;
use shelver_core::relocate;
use shelver_core::semantic::{MatchOptions, SemanticMatcher};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<SqliteStore>,
    matcher: Arc<dyn SemanticMatcher>,
    config: Arc<Config>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated.
pub async fn run_server(
    config: &Config,
    store: Arc<SqliteStore>,
    matcher: Arc<dyn SemanticMatcher>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        store,
        matcher,
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/documents/{id}/recheck", post(handle_recheck))
        .route("/recheck", post(handle_bulk_recheck))
        .route("/documents/{id}/move", post(handle_move))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "shelver server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Map a failed operation to the most appropriate HTTP status by
/// recovering the typed taxonomy from the anyhow chain. Anything not
/// in the taxonomy is an opaque internal error.
fn classify_error(err: anyhow::Error) -> AppError {
    let (status, code) = match err.downcast_ref::<AuditError>() {
        Some(e @ AuditError::NotFound(_)) => (StatusCode::NOT_FOUND, e.code()),
        Some(e @ AuditError::InvalidArgument(_)) => (StatusCode::BAD_REQUEST, e.code()),
        Some(e @ AuditError::UpstreamUnavailable(_)) => (StatusCode::BAD_GATEWAY, e.code()),
        Some(e @ AuditError::PersistenceConflict(_)) => (StatusCode::CONFLICT, e.code()),
        None => {
            tracing::error!(error = ?err, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    };
    AppError {
        status,
        code: code.to_string(),
        message: err.to_string(),
    }
}

/// Caller identity comes from the `X-Owner-Id` header.
fn owner_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-owner-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_request("missing X-Owner-Id header"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /documents/{id}/recheck ============

async fn handle_recheck(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<audit::AuditReport>, AppError> {
    let owner_id = owner_from_headers(&headers)?;
    let options = MatchOptions::for_audit(state.config.matcher.min_score);

    let report = audit::recheck_document(
        state.store.as_ref(),
        state.matcher.as_ref(),
        &document_id,
        &owner_id,
        &options,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(report))
}

// ============ POST /recheck ============

#[derive(Deserialize, Default)]
struct BulkRecheckRequest {
    #[serde(default)]
    library_id: Option<String>,
}

async fn handle_bulk_recheck(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<BulkRecheckRequest>>,
) -> Result<Json<reconcile::ReconcileReport>, AppError> {
    let owner_id = owner_from_headers(&headers)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let report = reconcile::bulk_recheck(
        state.store.as_ref(),
        &owner_id,
        request.library_id.as_deref(),
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(report))
}

// ============ POST /documents/{id}/move ============

#[derive(Deserialize)]
struct MoveRequest {
    target_library_id: String,
}

#[derive(Serialize)]
struct MoveResponse {
    document: relocate::RelocationOutcome,
}

async fn handle_move(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let owner_id = owner_from_headers(&headers)?;

    let outcome = relocate::move_document(
        state.store.as_ref(),
        &document_id,
        &request.target_library_id,
        &owner_id,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(MoveResponse { document: outcome }))
}
