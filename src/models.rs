use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed source document as delivered by the extraction collaborator.
/// Only documents with `extraction_success = true` enter the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub document_id: String,
    pub filename: String,
    #[serde(default)]
    pub source_url: String,
    pub text: String,
    #[serde(default)]
    pub char_count: usize,
    pub extraction_success: bool,
}

/// A bounded segment of a document's text — the unit of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    /// Unique within a document, assigned sequentially at chunk time.
    pub chunk_id: u32,
    pub filename: String,
    pub source_url: String,
    pub text: String,
    pub token_count: usize,
    pub char_count: usize,
}

impl Chunk {
    /// Composite key, unique per store.
    pub fn key(&self) -> String {
        format!("{}_{}", self.document_id, self.chunk_id)
    }
}

/// The persisted form of a chunk: text plus both optional vector fields.
///
/// Both embeddings are best-effort. A chunk indexed while the embedding or
/// expansion model was unavailable simply carries `None` for that field and
/// is invisible to the corresponding signal at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub document_id: String,
    pub chunk_id: u32,
    pub filename: String,
    pub source_url: String,
    pub text: String,
    /// Alias duplicate of `text`, persisted under a second field name so
    /// lexical consumers matching on either name find the chunk.
    pub content: String,
    pub token_count: usize,
    pub char_count: usize,
    /// L2-normalized dense vector; dimensionality fixed by the embedding model.
    pub dense_embedding: Option<Vec<f32>>,
    /// Term → non-negative weight map from the expansion model; size varies per chunk.
    pub sparse_expansion: Option<HashMap<String, f32>>,
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    pub fn key(&self) -> String {
        format!("{}_{}", self.document_id, self.chunk_id)
    }
}

/// The five retrieval modes. A closed set: unknown mode strings fail
/// deserialization at the API boundary instead of falling back silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    LexicalOnly,
    DenseOnly,
    SparseOnly,
    DenseLexical,
    FullHybrid,
}

/// A retrieval signal that contributed to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Lexical,
    Dense,
    Sparse,
}

/// One ranked retrieval result, carrying everything the answer-generation
/// stage and citation display need.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub document_id: String,
    pub chunk_id: u32,
    pub filename: String,
    pub source_url: String,
    pub content: String,
    /// Store-native score in single-signal modes, fused RRF score otherwise.
    pub score: f32,
    pub signals: Vec<Signal>,
}

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_search_mode")]
    pub search_mode: SearchMode,
}

fn default_top_k() -> usize {
    5
}

fn default_search_mode() -> SearchMode {
    SearchMode::DenseLexical
}

/// Query response
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub results: Vec<RetrievedChunk>,
    pub total_results: usize,
    pub llm_response: GeneratedAnswer,
}

/// Ingest request: a batch of pre-extracted documents.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub documents: Vec<ParsedDocument>,
}

/// Ingest response, aggregated across all chunks of all documents.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub documents_processed: usize,
    pub chunks_indexed: usize,
    pub errors: usize,
}

/// Per-batch indexing outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub indexed: usize,
    pub errors: usize,
}

/// A citation backing a generated answer.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub source_id: usize,
    pub filename: String,
    pub chunk_id: u32,
    pub content_excerpt: String,
    pub score: f32,
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Success,
    NoDocuments,
    ContentBlocked,
    IrrelevantDocuments,
    Error,
}

/// Generated answer plus the citations it rests on.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub status: AnswerStatus,
    pub model_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_mode_serializes_to_snake_case() {
        let json = serde_json::to_value(SearchMode::FullHybrid).unwrap();
        assert_eq!(json, "full_hybrid");
        let json = serde_json::to_value(SearchMode::LexicalOnly).unwrap();
        assert_eq!(json, "lexical_only");
    }

    #[test]
    fn test_search_mode_round_trips() {
        for mode in [
            SearchMode::LexicalOnly,
            SearchMode::DenseOnly,
            SearchMode::SparseOnly,
            SearchMode::DenseLexical,
            SearchMode::FullHybrid,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            let back: SearchMode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_unknown_search_mode_rejected() {
        let result = serde_json::from_str::<SearchMode>("\"semantic_only\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "what is docker?"}"#).unwrap();
        assert_eq!(req.top_k, 5);
        assert_eq!(req.search_mode, SearchMode::DenseLexical);
    }

    #[test]
    fn test_query_request_rejects_unknown_mode() {
        let result = serde_json::from_str::<QueryRequest>(
            r#"{"question": "q", "search_mode": "bm25"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_chunk_composite_key() {
        let chunk = Chunk {
            document_id: "doc-1".to_string(),
            chunk_id: 3,
            filename: "a.pdf".to_string(),
            source_url: String::new(),
            text: "hello".to_string(),
            token_count: 1,
            char_count: 5,
        };
        assert_eq!(chunk.key(), "doc-1_3");
    }
}
