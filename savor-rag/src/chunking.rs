//! Token-bounded document chunking.
//!
//! This module provides the [`Chunker`] trait and [`TokenTextSplitter`],
//! which cuts a document into windows of at most `chunk_size` tokens,
//! preferring to end each window on a sentence boundary.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::tokenizer::{Tokenizer, WordTokenizer};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no embeddable text.
    /// Ordinals start at zero for every document.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into windows bounded by a token budget.
///
/// Each window of `chunk_size` tokens is cut back to its last sentence
/// boundary (`.`, `?`, `!`, newline, or their full-width forms) when that
/// boundary lies more than `min_chunk_size_chars` characters into the
/// window. Trimmed chunks of `min_chunk_length_to_embed` characters or
/// fewer are dropped. At most `max_num_chunks` windows are cut from one
/// text; anything left after that is discarded with a warning.
///
/// # Example
///
/// ```rust,ignore
/// use savor_rag::TokenTextSplitter;
///
/// let splitter = TokenTextSplitter::new(800, 350, 5, 10_000);
/// let chunks = splitter.chunk(&document);
/// ```
#[derive(Clone)]
pub struct TokenTextSplitter {
    chunk_size: usize,
    min_chunk_size_chars: usize,
    min_chunk_length_to_embed: usize,
    max_num_chunks: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for TokenTextSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTextSplitter")
            .field("chunk_size", &self.chunk_size)
            .field("min_chunk_size_chars", &self.min_chunk_size_chars)
            .field("min_chunk_length_to_embed", &self.min_chunk_length_to_embed)
            .field("max_num_chunks", &self.max_num_chunks)
            .finish_non_exhaustive()
    }
}

impl Default for TokenTextSplitter {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl TokenTextSplitter {
    /// Create a new `TokenTextSplitter` using the [`WordTokenizer`].
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of tokens per chunk
    /// * `min_chunk_size_chars`: a sentence boundary before this many characters is ignored
    /// * `min_chunk_length_to_embed`: trimmed chunks this short or shorter are discarded
    /// * `max_num_chunks`: cap on the number of windows cut from one document
    pub fn new(
        chunk_size: usize,
        min_chunk_size_chars: usize,
        min_chunk_length_to_embed: usize,
        max_num_chunks: usize,
    ) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            min_chunk_size_chars,
            min_chunk_length_to_embed,
            max_num_chunks,
            tokenizer: Arc::new(WordTokenizer),
        }
    }

    /// Build a splitter from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(
            config.chunk_size,
            config.min_chunk_size_chars,
            config.min_chunk_length_to_embed,
            config.max_num_chunks,
        )
    }

    /// Replace the tokenizer used to measure windows.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Split raw text into trimmed chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut rest = text;
        let mut windows = 0;

        while !rest.is_empty() && windows < self.max_num_chunks {
            let tokens = self.tokenizer.encode(rest);
            if tokens.is_empty() {
                break;
            }
            let window_len: usize = tokens.iter().take(self.chunk_size).map(|t| t.len()).sum();
            let window = &rest[..window_len];
            windows += 1;

            if window.trim().is_empty() {
                rest = &rest[window_len..];
                continue;
            }

            let cut = match last_sentence_boundary(window) {
                Some(end) if window[..end].chars().count() > self.min_chunk_size_chars => end,
                _ => window_len,
            };

            self.push_if_embeddable(&mut pieces, &window[..cut]);
            rest = &rest[cut..];
        }

        if !rest.trim().is_empty() {
            warn!(
                max_num_chunks = self.max_num_chunks,
                dropped_tokens = self.tokenizer.count(rest),
                "chunk limit reached, discarding remaining text"
            );
        }

        pieces
    }

    fn push_if_embeddable(&self, pieces: &mut Vec<String>, text: &str) {
        let trimmed = text.trim();
        if trimmed.chars().count() > self.min_chunk_length_to_embed {
            pieces.push(trimmed.to_string());
        }
    }
}

/// Byte offset just past the last sentence-ending character, if any.
fn last_sentence_boundary(text: &str) -> Option<usize> {
    text.char_indices()
        .rev()
        .find(|(_, c)| matches!(c, '.' | '?' | '!' | '\n' | '。' | '？' | '！'))
        .map(|(i, c)| i + c.len_utf8())
}

impl Chunker for TokenTextSplitter {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document.id.clone(),
                ordinal,
                text,
                metadata: document.metadata.clone(),
                embedding: Vec::new(),
            })
            .collect()
    }
}
