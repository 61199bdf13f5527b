//! Word-window text chunker: overlapping segments with token/char counts.
//!
//! Splits cleaned text into word windows bounded by an estimated token
//! budget, carrying a fixed number of trailing words into the next window
//! so context is not cut mid-thought at chunk boundaries.

use crate::models::{Chunk, ParsedDocument};

/// A chunk of text before document metadata is attached.
#[derive(Debug, Clone)]
pub struct ChunkPiece {
    pub text: String,
    pub token_count: usize,
    pub char_count: usize,
}

/// Overlapping word-window chunker.
pub struct Chunker {
    /// Target chunk size in estimated tokens.
    chunk_size: usize,
    /// Trailing words carried into the next chunk.
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunk raw text into pieces with token/char counts.
    pub fn chunk_text(&self, text: &str) -> Vec<ChunkPiece> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let cleaned = clean_text(text);
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        let mut pieces = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_size = 0usize;

        for word in words {
            let word_tokens = estimate_tokens(word);

            if current_size + word_tokens > self.chunk_size && !current.is_empty() {
                pieces.push(make_piece(&current, current_size));

                // Carry trailing words into the next window
                if self.chunk_overlap > 0 && current.len() > self.chunk_overlap {
                    current = current[current.len() - self.chunk_overlap..].to_vec();
                    current_size = current.iter().map(|w| estimate_tokens(w)).sum();
                } else {
                    current.clear();
                    current_size = 0;
                }
            }

            current.push(word);
            current_size += word_tokens;
        }

        if !current.is_empty() {
            pieces.push(make_piece(&current, current_size));
        }

        tracing::debug!(
            "Created {} chunks from {} characters",
            pieces.len(),
            text.len()
        );
        pieces
    }

    /// Chunk a parsed document, attaching its metadata to every chunk.
    /// Chunk ids are assigned sequentially from 0.
    pub fn chunk_document(&self, document: &ParsedDocument) -> Vec<Chunk> {
        let pieces = self.chunk_text(&document.text);
        let count = pieces.len();

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk {
                document_id: document.document_id.clone(),
                chunk_id: i as u32,
                filename: document.filename.clone(),
                source_url: document.source_url.clone(),
                text: piece.text,
                token_count: piece.token_count,
                char_count: piece.char_count,
            })
            .collect();

        tracing::info!(
            "Document '{}' chunked into {count} pieces",
            document.filename
        );
        chunks
    }
}

fn make_piece(words: &[&str], token_count: usize) -> ChunkPiece {
    let text = words.join(" ");
    ChunkPiece {
        char_count: text.len(),
        token_count,
        text,
    }
}

/// Rough token estimate: ~4 characters per token.
fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Collapse whitespace and strip symbols, keeping word characters and
/// basic sentence punctuation.
fn clean_text(text: &str) -> String {
    let filtered: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '.' | '!' | '?' | ',' | ';' | ':' | '-' | '(' | ')' | '_')
            {
                c
            } else {
                ' '
            }
        })
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
