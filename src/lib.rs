//! # rag-search
//!
//! A document question-answering service built on multi-signal retrieval:
//! documents are chunked, indexed under three independent representations,
//! and queried through rank fusion with grounded answer generation on top.
//!
//! ## Pipeline
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │ Parsed Documents │
//!                 └────────┬─────────┘
//!                          ▼
//!                 ┌──────────────────┐
//!                 │     Chunker      │  word windows + overlap
//!                 └────────┬─────────┘
//!                          ▼
//!                 ┌──────────────────┐
//!                 │     Indexer      │  dense + sparse, best effort
//!                 └────────┬─────────┘
//!            ┌─────────────┼─────────────┐
//!            ▼             ▼             ▼
//!     ┌───────────┐ ┌───────────┐ ┌───────────┐
//!     │  Lexical  │ │   Dense   │ │  Sparse   │
//!     │  (BM25)   │ │ (vectors) │ │ (expand)  │
//!     └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!           └─────────────┼─────────────┘
//!                         ▼
//!                 ┌──────────────────┐
//!                 │    RRF Fusion    │  1/(60 + rank)
//!                 └────────┬─────────┘
//!                          ▼
//!                 ┌──────────────────┐
//!                 │   Result Cache   │  (query, mode, top_k)
//!                 └────────┬─────────┘
//!                          ▼
//!                 ┌──────────────────┐
//!                 │ Answer + Cites   │
//!                 └──────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dirs, and model endpoints
//! - [`models`] - Shared data types: chunks, search modes, request/response types
//! - [`chunking`] - Word-window chunker with overlap and token estimation
//! - [`ingestion`] - Document-batch chunking ahead of indexing
//! - [`embedding`] - Dense embeddings and sparse term expansions, best effort
//! - [`store`] - Tantivy full-text index plus persisted vector store, upsert by composite key
//! - [`indexing`] - Batch indexer tying embedding to storage
//! - [`retrieval`] - Five search modes, reciprocal-rank fusion, and the result cache
//! - [`generation`] - Grounded answer generation with citations and safety gates
//! - [`guardrails`] - Query validation and content-safety keyword filtering
//! - [`api`] - Axum HTTP handlers for ingest, query, health, and cache control
//! - [`state`] - Shared application state wiring stores, indexer, and retriever

pub mod api;
pub mod chunking;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod guardrails;
pub mod indexing;
pub mod ingestion;
pub mod models;
pub mod retrieval;
pub mod state;
pub mod store;
