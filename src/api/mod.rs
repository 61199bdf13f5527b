//! Axum HTTP handlers.

pub mod ingest;
pub mod query;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.doc_count() {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "indexed_chunks": count })),
        ),
        Err(e) => {
            tracing::error!("Health check failed to read index: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded" })),
            )
        }
    }
}

/// POST /cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.retriever.clear();
    tracing::info!("Result cache cleared");
    StatusCode::NO_CONTENT
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<crate::retrieval::CacheStats> {
    Json(state.retriever.stats())
}
