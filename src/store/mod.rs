//! Persistent chunk storage behind the three retrieval signals.
//!
//! A `DocumentStore` pairs a tantivy full-text index with a JSON-persisted
//! vector store. Both are written through `upsert`, keyed by the composite
//! `document_id _ chunk_id` key, so re-indexing a chunk replaces it in every
//! signal instead of duplicating it.

pub mod lexical;
pub mod vectors;

use std::path::Path;

use anyhow::Result;

use crate::models::StoredChunk;

pub use lexical::LexicalIndex;
pub use vectors::VectorStore;

/// A scored hit from any single retrieval signal.
#[derive(Debug, Clone)]
pub struct Hit {
    pub document_id: String,
    pub chunk_id: u32,
    pub filename: String,
    pub source_url: String,
    pub text: String,
    pub score: f32,
}

pub struct DocumentStore {
    lexical: LexicalIndex,
    vectors: VectorStore,
}

impl DocumentStore {
    pub fn open_or_create(index_dir: &Path, vector_dir: &Path) -> Result<Self> {
        Ok(Self {
            lexical: LexicalIndex::open_or_create(index_dir)?,
            vectors: VectorStore::open_or_create(vector_dir)?,
        })
    }

    /// Insert or replace a chunk in both backing stores.
    pub fn upsert(&self, chunk: &StoredChunk) -> Result<()> {
        self.lexical.upsert(chunk)?;
        self.vectors.upsert(chunk);
        Ok(())
    }

    /// Make pending writes durable and visible to searches.
    pub fn commit(&self) -> Result<()> {
        self.lexical.commit()?;
        self.vectors.persist()?;
        Ok(())
    }

    pub fn search_lexical(&self, query: &str, limit: usize) -> Result<Vec<Hit>> {
        self.lexical.search(query, limit)
    }

    pub fn search_dense(&self, query_embedding: &[f32], limit: usize) -> Vec<Hit> {
        self.vectors.search_dense(query_embedding, limit)
    }

    pub fn search_sparse(
        &self,
        query_expansion: &std::collections::HashMap<String, f32>,
        limit: usize,
    ) -> Vec<Hit> {
        self.vectors.search_sparse(query_expansion, limit)
    }

    /// Stored text for a chunk, if present.
    pub fn get_text(&self, document_id: &str, chunk_id: u32) -> Option<String> {
        self.vectors.get_text(document_id, chunk_id)
    }

    /// Live document count in the full-text index.
    pub fn doc_count(&self) -> Result<u64> {
        self.lexical.doc_count()
    }
}
