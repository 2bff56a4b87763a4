//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/analyze` | Estimate a site: body `{ url, tier, force? }` |
//! | `GET`  | `/api/analyze?limit=&search=` | Recent public analyses, newest first |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Invalid URL format" } }
//! ```
//!
//! Error codes: `bad_request` (400) for validation and malformed input,
//! `store_error` (500) when the database cannot be read. Crawl and model
//! failures are not errors here: they produce a fallback estimate.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the estimate form can
//! be served from anywhere.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use clonetime_core::error::AnalyzeError;
use clonetime_core::models::{AnalysisRequest, AnalysisResult, ListQuery, RawAnalysisRequest, StoredAnalysis};

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Build the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analyze", get(handle_list).post(handle_analyze))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let app = router(AppState {
        pipeline: Arc::new(pipeline),
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "listening");
    println!("Clonetime server listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
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

impl From<AnalyzeError> for AppError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::Validation(e) => bad_request(e.to_string()),
            AnalyzeError::Store(e) => {
                tracing::error!(error = %format!("{:#}", e), "store failure");
                store_error("Failed to read stored analyses")
            }
        }
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for database failures.
fn store_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "store_error".to_string(),
        message: message.into(),
    }
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

// ============ POST /api/analyze ============

/// Validates the body, then runs the pipeline. Always returns an estimate
/// unless the input is invalid or the cache lookup fails.
async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<RawAnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let Json(raw) = body.map_err(|e| bad_request(e.body_text()))?;
    let request = AnalysisRequest::try_from(raw).map_err(|e| bad_request(e.to_string()))?;

    let result = state.pipeline.analyze(&request).await?;
    Ok(Json(result))
}

// ============ GET /api/analyze ============

async fn handle_list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<StoredAnalysis>>, AppError> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let rows = state.pipeline.list(&query).await?;
    Ok(Json(rows))
}
