//! Embedding generation facade over both representation backends.
//!
//! Index-time embedding is best-effort: when a backend is unavailable or a
//! batch call fails, every text in the batch resolves to `None` and indexing
//! proceeds on the remaining signals. Query-time helpers surface the same
//! `Option` so callers can decide whether a missing representation is fatal
//! for the requested mode.

pub mod dense;
pub mod sparse;

use crate::config::{ExpanderConfig, LlmConfig};

pub use sparse::SparseExpansion;

pub struct EmbeddingGenerator {
    client: reqwest::Client,
    /// None when the configured provider is unrecognized.
    dense: Option<LlmConfig>,
    expander: ExpanderConfig,
}

impl EmbeddingGenerator {
    pub fn new(client: reqwest::Client, llm: LlmConfig, expander: ExpanderConfig) -> Self {
        let dense = match llm.provider.as_str() {
            "ollama" | "openai" => Some(llm),
            other => {
                tracing::warn!("Unknown LLM provider '{other}', dense embeddings disabled");
                None
            }
        };
        Self {
            client,
            dense,
            expander,
        }
    }

    pub fn dense_enabled(&self) -> bool {
        self.dense.is_some()
    }

    pub fn sparse_enabled(&self) -> bool {
        self.expander.base_url.is_some()
    }

    /// Embed a batch of texts. Always returns a Vec parallel with `texts`;
    /// on backend failure every position is `None` and a warning is logged.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let Some(config) = &self.dense else {
            return vec![None; texts.len()];
        };
        if texts.is_empty() {
            return Vec::new();
        }

        match dense::embed_batch(&self.client, config, texts).await {
            Ok(embeddings) => embeddings.into_iter().map(Some).collect(),
            Err(e) => {
                tracing::warn!("Dense embedding failed, indexing without vectors: {e:#}");
                vec![None; texts.len()]
            }
        }
    }

    /// Expand a batch of texts into sparse term maps, parallel with `texts`.
    pub async fn expand_batch(&self, texts: &[String]) -> Vec<Option<SparseExpansion>> {
        if !self.sparse_enabled() {
            return vec![None; texts.len()];
        }
        if texts.is_empty() {
            return Vec::new();
        }

        match sparse::expand_batch(&self.client, &self.expander, texts).await {
            Ok(expansions) => expansions.into_iter().map(Some).collect(),
            Err(e) => {
                tracing::warn!("Sparse expansion failed, indexing without expansions: {e:#}");
                vec![None; texts.len()]
            }
        }
    }

    /// Embed a single query. `None` when the backend is disabled or the call fails.
    pub async fn embed_query(&self, query: &str) -> Option<Vec<f32>> {
        let config = self.dense.as_ref()?;
        match dense::embed_single(&self.client, config, query).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Query embedding failed: {e:#}");
                None
            }
        }
    }

    /// Expand a single query. `None` when the sidecar is disabled or the call fails.
    pub async fn expand_query(&self, query: &str) -> Option<SparseExpansion> {
        if !self.sparse_enabled() {
            return None;
        }
        match sparse::expand_batch(&self.client, &self.expander, &[query.to_string()]).await {
            Ok(mut expansions) => expansions.pop(),
            Err(e) => {
                tracing::warn!("Query expansion failed: {e:#}");
                None
            }
        }
    }
}
