use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, Term};

use crate::models::StoredChunk;
use crate::store::Hit;

/// Full-text (BM25) index built on tantivy.
///
/// Writes go through a single long-lived writer. The composite chunk key is
/// indexed raw so an upsert can delete the previous generation of a chunk by
/// exact term before adding the new one.
pub struct LexicalIndex {
    index: Index,
    writer: Mutex<IndexWriter>,
    // Field handles
    f_key: Field,
    f_document_id: Field,
    f_chunk_id: Field,
    f_filename: Field,
    f_source_url: Field,
    f_text: Field,
    f_content: Field,
    f_token_count: Field,
    f_char_count: Field,
    f_indexed_at: Field,
}

impl LexicalIndex {
    /// Create or open the index at the given directory.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let mut schema_builder = Schema::builder();
        let f_key = schema_builder.add_text_field("key", STRING | STORED);
        let f_document_id = schema_builder.add_text_field("document_id", STRING | STORED);
        let f_chunk_id =
            schema_builder.add_u64_field("chunk_id", NumericOptions::default() | STORED);
        let f_filename = schema_builder.add_text_field("filename", TEXT | STORED);
        let f_source_url = schema_builder.add_text_field("source_url", STRING | STORED);
        let f_text = schema_builder.add_text_field("text", TEXT | STORED);
        // Alias of `text`; external lexical consumers match on either name
        let f_content = schema_builder.add_text_field("content", TEXT | STORED);
        let f_token_count =
            schema_builder.add_u64_field("token_count", NumericOptions::default() | STORED);
        let f_char_count =
            schema_builder.add_u64_field("char_count", NumericOptions::default() | STORED);
        let f_indexed_at = schema_builder.add_text_field("indexed_at", STRING | STORED);

        let schema = schema_builder.build();

        let index = if index_dir.join("meta.json").exists() {
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?
        } else {
            Index::create_in_dir(index_dir, schema.clone())
                .context("Failed to create tantivy index")?
        };

        let writer = index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        Ok(Self {
            index,
            writer: Mutex::new(writer),
            f_key,
            f_document_id,
            f_chunk_id,
            f_filename,
            f_source_url,
            f_text,
            f_content,
            f_token_count,
            f_char_count,
            f_indexed_at,
        })
    }

    /// Insert or replace a chunk. Delete-by-key before add keeps repeated
    /// ingestion of the same chunk from accumulating duplicates.
    pub fn upsert(&self, chunk: &StoredChunk) -> Result<()> {
        let writer = self.writer.lock();

        let key = chunk.key();
        writer.delete_term(Term::from_field_text(self.f_key, &key));

        writer.add_document(doc!(
            self.f_key => key,
            self.f_document_id => chunk.document_id.clone(),
            self.f_chunk_id => chunk.chunk_id as u64,
            self.f_filename => chunk.filename.clone(),
            self.f_source_url => chunk.source_url.clone(),
            self.f_text => chunk.text.clone(),
            self.f_content => chunk.content.clone(),
            self.f_token_count => chunk.token_count as u64,
            self.f_char_count => chunk.char_count as u64,
            self.f_indexed_at => chunk.indexed_at.to_rfc3339(),
        ))?;

        Ok(())
    }

    /// Commit pending writes, making them visible to new readers.
    pub fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.commit().context("Failed to commit index")?;
        Ok(())
    }

    /// Search the index and return scored hits.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<Hit>> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create reader")?;

        let searcher = reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.f_text, self.f_content]);
        let query = query_parser
            .parse_query(query_str)
            .context("Failed to parse search query")?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Search failed")?;

        let mut hits = Vec::new();

        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;

            let document_id = doc
                .get_first(self.f_document_id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let chunk_id = doc
                .get_first(self.f_chunk_id)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;

            let filename = doc
                .get_first(self.f_filename)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let source_url = doc
                .get_first(self.f_source_url)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let text = doc
                .get_first(self.f_text)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            hits.push(Hit {
                document_id,
                chunk_id,
                filename,
                source_url,
                text,
                score,
            });
        }

        Ok(hits)
    }

    /// Live (non-deleted) document count.
    pub fn doc_count(&self) -> Result<u64> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create reader")?;
        Ok(reader.searcher().num_docs())
    }
}
