//! HTTP trigger surface.
//!
//! | Method | Path                  | Response                                   |
//! |--------|-----------------------|--------------------------------------------|
//! | POST   | `/process`            | 202 accepted, 400 bad request, 503 busy    |
//! | GET    | `/verify/{asset_id}`  | 200 verification, 404 unknown asset        |
//! | GET    | `/health`             | 200 index and pool status                  |
//!
//! Processing happens in the [`WorkerPool`]; `/process` only queues.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use proofpix_index::IndexManager;

use crate::pipeline::AssetTrigger;
use crate::pool::WorkerPool;
use crate::verify::{Verification, Verifier, VerifyError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
    pub verifier: Arc<Verifier>,
    pub index: Arc<IndexManager>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pool", &self.pool)
            .field("index_size", &self.index.len())
            .finish()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/process", post(process_handler))
        .route("/verify/:asset_id", get(verify_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn process_handler(
    State(state): State<AppState>,
    body: Result<Json<AssetTrigger>, JsonRejection>,
) -> Response {
    let Json(trigger) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "invalid process request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    if let Err(e) = trigger.validate() {
        warn!(error = %e, "invalid process request");
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let asset_id = trigger.asset_id.clone();
    match state.pool.submit(trigger) {
        Ok(()) => {
            info!(asset_id = %asset_id, "trigger accepted");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "accepted", "asset_id": asset_id })),
            )
                .into_response()
        }
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn verify_handler(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Response {
    match state.verifier.verify(&asset_id).await {
        Ok(Verification::NotFound) => {
            (StatusCode::NOT_FOUND, Json(Verification::NotFound)).into_response()
        }
        Ok(verification) => (StatusCode::OK, Json(verification)).into_response(),
        Err(e @ VerifyError::LogNotConfigured { .. }) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => {
            warn!(asset_id = %asset_id, error = %e, "verification failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    has_index: bool,
    index_size: usize,
    accepting: bool,
    in_flight: usize,
    queued: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.pool.stats();
    Json(HealthResponse {
        status: "ok",
        has_index: state.index.has_index(),
        index_size: state.index.len(),
        accepting: state.pool.is_running(),
        in_flight: stats.in_flight,
        queued: stats.queued,
    })
}
