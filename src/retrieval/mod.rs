//! Multi-signal retrieval: per-signal search plus rank fusion.

pub mod cache;
pub mod fusion;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingGenerator;
use crate::models::{RetrievedChunk, SearchMode, Signal};
use crate::store::{DocumentStore, Hit};

use fusion::{reciprocal_rank_fusion, SignalList};

pub use cache::{CacheStats, CachedRetriever, Retrieve};

/// Fused modes search each signal deeper than the requested cutoff so a
/// chunk ranked just past `top_k` in two signals can still fuse into the
/// final page.
fn oversample(top_k: usize) -> usize {
    top_k.max(20)
}

pub struct HybridRetriever {
    store: Arc<DocumentStore>,
    embedder: Arc<EmbeddingGenerator>,
}

impl HybridRetriever {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<EmbeddingGenerator>) -> Self {
        Self { store, embedder }
    }

    /// Retrieve the top chunks for a query in the requested mode.
    ///
    /// Single-signal modes return that signal's native ranking and fail when
    /// the signal is unavailable. Fused modes degrade: a failed signal is
    /// logged and fusion proceeds over the rest, erring only when every
    /// signal failed.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>> {
        match mode {
            SearchMode::LexicalOnly => {
                let hits = self.search_lexical(query, top_k).await?;
                Ok(single_signal_results(hits, Signal::Lexical))
            }
            SearchMode::DenseOnly => {
                let hits = self.search_dense(query, top_k).await?;
                Ok(single_signal_results(hits, Signal::Dense))
            }
            SearchMode::SparseOnly => {
                let hits = self.search_sparse(query, top_k).await?;
                Ok(single_signal_results(hits, Signal::Sparse))
            }
            SearchMode::DenseLexical => {
                let limit = oversample(top_k);
                let (lexical, dense) = tokio::join!(
                    self.search_lexical(query, limit),
                    self.search_dense(query, limit),
                );
                fuse_available(
                    vec![(Signal::Lexical, lexical), (Signal::Dense, dense)],
                    top_k,
                )
            }
            SearchMode::FullHybrid => {
                let limit = oversample(top_k);
                let (lexical, dense, sparse) = tokio::join!(
                    self.search_lexical(query, limit),
                    self.search_dense(query, limit),
                    self.search_sparse(query, limit),
                );
                fuse_available(
                    vec![
                        (Signal::Lexical, lexical),
                        (Signal::Dense, dense),
                        (Signal::Sparse, sparse),
                    ],
                    top_k,
                )
            }
        }
    }

    async fn search_lexical(&self, query: &str, limit: usize) -> Result<Vec<Hit>> {
        let store = Arc::clone(&self.store);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || store.search_lexical(&query, limit))
            .await
            .context("Lexical search task failed")?
    }

    async fn search_dense(&self, query: &str, limit: usize) -> Result<Vec<Hit>> {
        let embedding = self
            .embedder
            .embed_query(query)
            .await
            .context("Dense signal unavailable: no query embedding")?;
        Ok(self.store.search_dense(&embedding, limit))
    }

    async fn search_sparse(&self, query: &str, limit: usize) -> Result<Vec<Hit>> {
        let expansion = self
            .embedder
            .expand_query(query)
            .await
            .context("Sparse signal unavailable: no query expansion")?;
        Ok(self.store.search_sparse(&expansion, limit))
    }
}

impl Retrieve for HybridRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>> {
        HybridRetriever::retrieve(self, query, top_k, mode).await
    }
}

fn single_signal_results(hits: Vec<Hit>, signal: Signal) -> Vec<RetrievedChunk> {
    hits.into_iter()
        .map(|hit| RetrievedChunk {
            document_id: hit.document_id,
            chunk_id: hit.chunk_id,
            filename: hit.filename,
            source_url: hit.source_url,
            content: hit.text,
            score: hit.score,
            signals: vec![signal],
        })
        .collect()
}

/// Fuse whichever signals succeeded. Erring only when none did keeps a
/// degraded deployment (say, the embedding model down) answering queries
/// on its remaining signals.
fn fuse_available(
    outcomes: Vec<(Signal, Result<Vec<Hit>>)>,
    top_k: usize,
) -> Result<Vec<RetrievedChunk>> {
    let total = outcomes.len();
    let mut lists = Vec::new();

    for (signal, outcome) in outcomes {
        match outcome {
            Ok(hits) => lists.push(SignalList { signal, hits }),
            Err(e) => tracing::warn!("Signal {signal:?} failed, fusing without it: {e:#}"),
        }
    }

    if lists.is_empty() {
        anyhow::bail!("All {total} retrieval signals failed");
    }

    Ok(reciprocal_rank_fusion(lists, top_k))
}
