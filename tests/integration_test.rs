//! Integration tests for the indexing and retrieval pipeline.
//!
//! These tests exercise the full flow without requiring a running LLM or
//! expansion sidecar; both embedding backends are disabled, so indexing
//! proceeds on the lexical signal and vectors are injected directly where
//! a test needs them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use rag_search::chunking::Chunker;
use rag_search::config::{ExpanderConfig, LlmConfig};
use rag_search::embedding::EmbeddingGenerator;
use rag_search::indexing::Indexer;
use rag_search::ingestion;
use rag_search::models::{Chunk, ParsedDocument, SearchMode, Signal, StoredChunk};
use rag_search::retrieval::fusion::{reciprocal_rank_fusion, SignalList};
use rag_search::retrieval::{CachedRetriever, HybridRetriever};
use rag_search::store::DocumentStore;

fn open_store(dir: &TempDir) -> Arc<DocumentStore> {
    Arc::new(
        DocumentStore::open_or_create(&dir.path().join("index"), &dir.path().join("vectors"))
            .unwrap(),
    )
}

/// An embedder with no reachable backends: every representation is None.
fn offline_embedder() -> Arc<EmbeddingGenerator> {
    let llm = LlmConfig {
        provider: "offline".to_string(),
        ..LlmConfig::default()
    };
    Arc::new(EmbeddingGenerator::new(
        reqwest::Client::new(),
        llm,
        ExpanderConfig::default(),
    ))
}

fn sample_chunks() -> Vec<Chunk> {
    let texts = [
        "docker containers share the host kernel and isolate processes",
        "virtual machines emulate hardware and run separate kernels",
        "kubernetes schedules containers across a cluster of nodes",
    ];
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            document_id: "doc-1".to_string(),
            chunk_id: i as u32,
            filename: "infra.txt".to_string(),
            source_url: "https://example.com/infra".to_string(),
            text: text.to_string(),
            token_count: text.len() / 4,
            char_count: text.len(),
        })
        .collect()
}

fn stored_with_vectors(
    document_id: &str,
    dense: Vec<f32>,
    sparse: HashMap<String, f32>,
    text: &str,
) -> StoredChunk {
    StoredChunk {
        document_id: document_id.to_string(),
        chunk_id: 0,
        filename: format!("{document_id}.txt"),
        source_url: String::new(),
        text: text.to_string(),
        content: text.to_string(),
        token_count: text.len() / 4,
        char_count: text.len(),
        dense_embedding: Some(dense),
        sparse_expansion: Some(sparse),
        indexed_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_empty_batch_indexes_nothing() {
    let dir = TempDir::new().unwrap();
    let indexer = Indexer::new(open_store(&dir), offline_embedder());

    let stats = indexer.index_chunks(&[]).await.unwrap();
    assert_eq!(stats.indexed, 0);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_index_without_embeddings_succeeds() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());

    let stats = indexer.index_chunks(&sample_chunks()).await.unwrap();
    assert_eq!(stats.indexed, 3);
    assert_eq!(stats.errors, 0);
    assert_eq!(store.doc_count().unwrap(), 3);

    // Lexical search works; dense has nothing to serve
    let hits = store.search_lexical("kernel", 10).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(store.search_dense(&[1.0, 0.0], 10).is_empty());
}

#[tokio::test]
async fn test_reindexing_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());

    let chunks = sample_chunks();
    indexer.index_chunks(&chunks).await.unwrap();
    indexer.index_chunks(&chunks).await.unwrap();

    assert_eq!(store.doc_count().unwrap(), 3);

    let hits = store.search_lexical("kubernetes", 10).unwrap();
    assert_eq!(hits.len(), 1, "no duplicate hits after re-index");
}

#[tokio::test]
async fn test_stored_text_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());

    let chunks = sample_chunks();
    indexer.index_chunks(&chunks).await.unwrap();

    let text = store.get_text("doc-1", 2).unwrap();
    assert_eq!(text, chunks[2].text);
    assert!(store.get_text("doc-1", 99).is_none());
}

#[tokio::test]
async fn test_chunk_then_index_pipeline() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());

    let body = (0..200)
        .map(|i| format!("sentence{i} about container runtimes and kernels."))
        .collect::<Vec<_>>()
        .join(" ");
    let documents = vec![ParsedDocument {
        document_id: "doc-9".to_string(),
        filename: "runtimes.txt".to_string(),
        source_url: String::new(),
        text: body,
        char_count: 0,
        extraction_success: true,
    }];

    let chunker = Chunker::new(100, 10);
    let chunks = ingestion::chunk_documents(&chunker, &documents);
    assert!(chunks.len() > 1);

    let stats = indexer.index_chunks(&chunks).await.unwrap();
    assert_eq!(stats.indexed, chunks.len());
    assert_eq!(store.doc_count().unwrap() as usize, chunks.len());
}

#[tokio::test]
async fn test_full_hybrid_degrades_to_lexical_when_models_offline() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());
    indexer.index_chunks(&sample_chunks()).await.unwrap();

    let retriever = HybridRetriever::new(store, offline_embedder());
    let results = retriever
        .retrieve("kernel", 5, SearchMode::FullHybrid)
        .await
        .unwrap();

    assert!(!results.is_empty());
    for result in &results {
        assert_eq!(result.signals, vec![Signal::Lexical]);
    }
}

#[tokio::test]
async fn test_dense_only_fails_when_embedder_offline() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());
    indexer.index_chunks(&sample_chunks()).await.unwrap();

    let retriever = HybridRetriever::new(store, offline_embedder());
    assert!(retriever
        .retrieve("kernel", 5, SearchMode::DenseOnly)
        .await
        .is_err());
    assert!(retriever
        .retrieve("kernel", 5, SearchMode::SparseOnly)
        .await
        .is_err());
}

#[tokio::test]
async fn test_empty_index_returns_no_results() {
    let dir = TempDir::new().unwrap();
    let retriever = HybridRetriever::new(open_store(&dir), offline_embedder());

    let results = retriever
        .retrieve("anything at all", 5, SearchMode::LexicalOnly)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_fusion_ranks_cross_signal_agreement_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    // "agreed" matches the query in every signal; the others in one each.
    let kernel_terms = HashMap::from([("kernel".to_string(), 2.0)]);
    store
        .upsert(&stored_with_vectors(
            "agreed",
            vec![0.9, 0.1],
            kernel_terms.clone(),
            "containers share the host kernel",
        ))
        .unwrap();
    store
        .upsert(&stored_with_vectors(
            "dense-only",
            vec![1.0, 0.0],
            HashMap::from([("hardware".to_string(), 3.0)]),
            "virtual machines emulate hardware",
        ))
        .unwrap();
    store
        .upsert(&stored_with_vectors(
            "sparse-only",
            vec![0.0, 1.0],
            HashMap::from([("kernel".to_string(), 5.0)]),
            "schedulers place workloads on nodes",
        ))
        .unwrap();
    store.commit().unwrap();

    let top_k = 3;
    let lexical = store.search_lexical("kernel containers", 20).unwrap();
    let dense = store.search_dense(&[0.9, 0.1], 20);
    let sparse = store.search_sparse(&HashMap::from([("kernel".to_string(), 1.0)]), 20);
    assert!(!lexical.is_empty());
    assert!(!dense.is_empty());
    assert!(!sparse.is_empty());

    let fused = reciprocal_rank_fusion(
        vec![
            SignalList {
                signal: Signal::Lexical,
                hits: lexical,
            },
            SignalList {
                signal: Signal::Dense,
                hits: dense,
            },
            SignalList {
                signal: Signal::Sparse,
                hits: sparse,
            },
        ],
        top_k,
    );

    assert!(fused.len() <= top_k);
    assert_eq!(fused[0].document_id, "agreed");
    assert_eq!(fused[0].signals.len(), 3);
}

#[tokio::test]
async fn test_cached_retriever_over_live_pipeline() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let indexer = Indexer::new(Arc::clone(&store), offline_embedder());
    indexer.index_chunks(&sample_chunks()).await.unwrap();

    let cache = CachedRetriever::new(HybridRetriever::new(store, offline_embedder()), None);

    let first = cache
        .retrieve("kernel", 5, SearchMode::LexicalOnly)
        .await
        .unwrap();
    let second = cache
        .retrieve("kernel", 5, SearchMode::LexicalOnly)
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    cache.clear();
    assert_eq!(cache.stats().entries, 0);
}
