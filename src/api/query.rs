use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::generation;
use crate::guardrails;
use crate::models::{QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /query
///
/// Retrieve in the requested mode, then generate a grounded answer over the
/// results. An unknown `search_mode` never reaches this handler; the closed
/// enum rejects it during deserialization.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();

    guardrails::validate_query(&question, req.top_k)
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let results = state
        .retriever
        .retrieve(&question, req.top_k, req.search_mode)
        .await
        .map_err(|e| {
            tracing::error!("Retrieval failed for '{question}': {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Retrieval failed: {e}"),
            )
        })?;

    let llm_response = generation::generate_with_citations(
        &state.http_client,
        &state.config.llm,
        &question,
        &results,
    )
    .await;

    Ok(Json(QueryResponse {
        question,
        total_results: results.len(),
        results,
        llm_response,
    }))
}
