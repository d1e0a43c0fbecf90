//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in tokens.
    pub chunk_size: usize,
    /// Sentence boundaries closer than this many characters to a window's start are ignored.
    pub min_chunk_size_chars: usize,
    /// Chunks with this many characters or fewer (after trimming) are discarded.
    pub min_chunk_length_to_embed: usize,
    /// Maximum number of token windows cut from a single section.
    pub max_num_chunks: usize,
    /// Number of top results returned when the caller does not specify one.
    pub top_k: usize,
    /// Minimum similarity score for results. `None` keeps every result,
    /// including those with negative scores.
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            min_chunk_size_chars: 350,
            min_chunk_length_to_embed: 5,
            max_num_chunks: 10_000,
            top_k: 5,
            similarity_threshold: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in tokens.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the minimum window length, in characters, before a sentence break is honoured.
    pub fn min_chunk_size_chars(mut self, chars: usize) -> Self {
        self.config.min_chunk_size_chars = chars;
        self
    }

    /// Set the minimum trimmed length a chunk needs to be stored.
    pub fn min_chunk_length_to_embed(mut self, chars: usize) -> Self {
        self.config.min_chunk_length_to_embed = chars;
        self
    }

    /// Set the maximum number of windows per section.
    pub fn max_num_chunks(mut self, max: usize) -> Self {
        self.config.max_num_chunks = max;
        self
    }

    /// Set the default number of search results.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `max_num_chunks == 0`
    /// - `top_k == 0`
    /// - `similarity_threshold` is set but not finite
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.max_num_chunks == 0 {
            return Err(RagError::Config("max_num_chunks must be greater than zero".to_string()));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if let Some(threshold) = self.config.similarity_threshold.filter(|t| !t.is_finite()) {
            return Err(RagError::Config(format!(
                "similarity_threshold ({threshold}) must be a finite number"
            )));
        }
        Ok(self.config)
    }
}
