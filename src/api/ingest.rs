use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::chunking::Chunker;
use crate::ingestion;
use crate::models::{IngestRequest, IngestResponse};
use crate::state::AppState;

/// POST /ingest
///
/// Chunk and index a batch of pre-extracted documents. Per-chunk failures
/// are counted in the response; only a failed commit is a server error.
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let documents_processed = req
        .documents
        .iter()
        .filter(|d| d.extraction_success)
        .count();

    let chunker = Chunker::new(state.config.chunk_size, state.config.chunk_overlap);
    let chunks = ingestion::chunk_documents(&chunker, &req.documents);

    tracing::info!(
        "Ingesting {} documents ({} chunks)",
        documents_processed,
        chunks.len()
    );

    let stats = state.indexer.index_chunks(&chunks).await.map_err(|e| {
        tracing::error!("Ingest failed: {e:#}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Indexing failed: {e}"),
        )
    })?;

    Ok(Json(IngestResponse {
        documents_processed,
        chunks_indexed: stats.indexed,
        errors: stats.errors,
    }))
}
