use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::models::StoredChunk;
use crate::store::Hit;

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    document_id: String,
    chunk_id: u32,
    filename: String,
    source_url: String,
    text: String,
    dense: Option<Vec<f32>>,
    sparse: Option<HashMap<String, f32>>,
    indexed_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory vector store with disk persistence.
///
/// Serves both the dense signal (dot product over unit vectors) and the
/// sparse signal (weighted term overlap). Entries missing a representation
/// are skipped by that signal rather than scored at zero.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: std::path::PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data =
                std::fs::read_to_string(&persist_path).context("Failed to read vector store")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Insert or replace the entry for a chunk's composite key.
    pub fn upsert(&self, chunk: &StoredChunk) {
        let mut entries = self.entries.write();
        entries.retain(|e| !(e.document_id == chunk.document_id && e.chunk_id == chunk.chunk_id));
        entries.push(VectorEntry {
            document_id: chunk.document_id.clone(),
            chunk_id: chunk.chunk_id,
            filename: chunk.filename.clone(),
            source_url: chunk.source_url.clone(),
            text: chunk.text.clone(),
            dense: chunk.dense_embedding.clone(),
            sparse: chunk.sparse_expansion.clone(),
            indexed_at: chunk.indexed_at,
        });
    }

    /// Persist all entries to disk.
    pub fn persist(&self) -> Result<()> {
        let entries = self.entries.read();
        let data = serde_json::to_string(&*entries)?;
        std::fs::write(&self.persist_path, data).context("Failed to write vector store")?;
        Ok(())
    }

    /// Dot-product search over entries that carry a dense vector. Stored
    /// vectors are unit-normalized, so this ranks identically to cosine.
    pub fn search_dense(&self, query_embedding: &[f32], limit: usize) -> Vec<Hit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter_map(|e| {
                let dense = e.dense.as_ref()?;
                Some((dot_product(query_embedding, dense), e))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored.into_iter().map(|(score, e)| to_hit(e, score)).collect()
    }

    /// Weighted term-overlap search over entries that carry a sparse
    /// expansion. Entries sharing no terms with the query are dropped.
    pub fn search_sparse(&self, query_expansion: &HashMap<String, f32>, limit: usize) -> Vec<Hit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter_map(|e| {
                let sparse = e.sparse.as_ref()?;
                let score: f32 = query_expansion
                    .iter()
                    .filter_map(|(term, qw)| sparse.get(term).map(|dw| qw * dw))
                    .sum();
                (score > 0.0).then_some((score, e))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored.into_iter().map(|(score, e)| to_hit(e, score)).collect()
    }

    /// Stored chunk text by composite key.
    pub fn get_text(&self, document_id: &str, chunk_id: u32) -> Option<String> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|e| e.document_id == document_id && e.chunk_id == chunk_id)
            .map(|e| e.text.clone())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

fn to_hit(e: &VectorEntry, score: f32) -> Hit {
    Hit {
        document_id: e.document_id.clone(),
        chunk_id: e.chunk_id,
        filename: e.filename.clone(),
        source_url: e.source_url.clone(),
        text: e.text.clone(),
        score,
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn stored(
        document_id: &str,
        chunk_id: u32,
        dense: Option<Vec<f32>>,
        sparse: Option<HashMap<String, f32>>,
    ) -> StoredChunk {
        StoredChunk {
            document_id: document_id.to_string(),
            chunk_id,
            filename: format!("{document_id}.txt"),
            source_url: String::new(),
            text: format!("chunk {chunk_id} of {document_id}"),
            content: format!("chunk {chunk_id} of {document_id}"),
            token_count: 4,
            char_count: 20,
            dense_embedding: dense,
            sparse_expansion: sparse,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn test_dense_search_ranks_by_dot_product() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();

        store.upsert(&stored("a", 0, Some(vec![1.0, 0.0]), None));
        store.upsert(&stored("b", 0, Some(vec![0.0, 1.0]), None));
        store.upsert(&stored("c", 0, None, None));

        let hits = store.search_dense(&[1.0, 0.0], 10);
        assert_eq!(hits.len(), 2, "entries without vectors are skipped");
        assert_eq!(hits[0].document_id, "a");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sparse_search_sums_overlapping_weights() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();

        store.upsert(&stored(
            "a",
            0,
            None,
            Some(HashMap::from([
                ("kernel".to_string(), 2.0),
                ("container".to_string(), 1.0),
            ])),
        ));
        store.upsert(&stored(
            "b",
            0,
            None,
            Some(HashMap::from([("hardware".to_string(), 3.0)])),
        ));

        let query = HashMap::from([
            ("kernel".to_string(), 1.5),
            ("container".to_string(), 0.5),
        ]);
        let hits = store.search_sparse(&query, 10);
        assert_eq!(hits.len(), 1, "no-overlap entries are dropped");
        assert_eq!(hits[0].document_id, "a");
        assert!((hits[0].score - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();

        store.upsert(&stored("a", 0, Some(vec![1.0, 0.0]), None));
        store.upsert(&stored("a", 0, Some(vec![0.0, 1.0]), None));

        assert_eq!(store.entry_count(), 1);
        let hits = store.search_dense(&[0.0, 1.0], 10);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempdir().unwrap();
        {
            let store = VectorStore::open_or_create(dir.path()).unwrap();
            store.upsert(&stored("a", 0, Some(vec![1.0]), None));
            store.persist().unwrap();
        }
        let reopened = VectorStore::open_or_create(dir.path()).unwrap();
        assert_eq!(reopened.entry_count(), 1);
        assert_eq!(
            reopened.get_text("a", 0),
            Some("chunk 0 of a".to_string())
        );
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store.upsert(&stored("a", 0, Some(vec![1.0, 0.0, 0.0]), None));

        let hits = store.search_dense(&[1.0, 0.0], 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
    }
}
