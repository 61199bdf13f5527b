//! Batch chunk indexing: embed, expand, upsert, commit.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::embedding::EmbeddingGenerator;
use crate::models::{Chunk, IngestStats, StoredChunk};
use crate::store::DocumentStore;

pub struct Indexer {
    store: Arc<DocumentStore>,
    embedder: Arc<EmbeddingGenerator>,
}

impl Indexer {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<EmbeddingGenerator>) -> Self {
        Self { store, embedder }
    }

    /// Index a batch of chunks. Embeddings are fetched up front for the whole
    /// batch; a chunk that fails to store is counted and skipped, never
    /// aborting the rest of the batch.
    pub async fn index_chunks(&self, chunks: &[Chunk]) -> Result<IngestStats> {
        if chunks.is_empty() {
            return Ok(IngestStats::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let dense = self.embedder.embed_batch(&texts).await;
        let sparse = self.embedder.expand_batch(&texts).await;

        let dense = ensure_parallel(dense, chunks.len(), "dense embeddings");
        let sparse = ensure_parallel(sparse, chunks.len(), "sparse expansions");

        let mut stats = IngestStats::default();

        for ((chunk, dense_embedding), sparse_expansion) in
            chunks.iter().zip(dense).zip(sparse)
        {
            let stored = StoredChunk {
                document_id: chunk.document_id.clone(),
                chunk_id: chunk.chunk_id,
                filename: chunk.filename.clone(),
                source_url: chunk.source_url.clone(),
                text: chunk.text.clone(),
                content: chunk.text.clone(),
                token_count: chunk.token_count,
                char_count: chunk.char_count,
                dense_embedding,
                sparse_expansion,
                indexed_at: Utc::now(),
            };

            match self.store.upsert(&stored) {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    tracing::error!("Failed to index chunk {}: {e:#}", stored.key());
                    stats.errors += 1;
                }
            }
        }

        self.store.commit().context("Failed to commit index")?;

        tracing::info!(
            "Indexed {} chunks, {} errors",
            stats.indexed,
            stats.errors
        );
        Ok(stats)
    }
}

/// Guard against an embedding batch of the wrong length. A short or long
/// vector would silently misalign chunks with their representations when
/// zipped, so degrade the whole batch to `None` instead.
fn ensure_parallel<T>(values: Vec<Option<T>>, expected: usize, what: &str) -> Vec<Option<T>> {
    if values.len() == expected {
        values
    } else {
        tracing::error!(
            "Expected {expected} {what}, got {}; dropping them for this batch",
            values.len()
        );
        std::iter::repeat_with(|| None).take(expected).collect()
    }
}
