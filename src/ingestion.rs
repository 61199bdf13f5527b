//! Document-batch chunking ahead of indexing.

use crate::chunking::Chunker;
use crate::models::{Chunk, ParsedDocument};

/// Chunk every successfully extracted document in the batch. Failed
/// extractions are skipped with a warning; their text is unusable.
pub fn chunk_documents(chunker: &Chunker, documents: &[ParsedDocument]) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for document in documents {
        if !document.extraction_success {
            tracing::warn!(
                "Skipping document '{}' ({}): extraction failed",
                document.filename,
                document.document_id
            );
            continue;
        }
        chunks.extend(chunker.chunk_document(document));
    }

    chunks
}
