//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A section of source text read from a file, before splitting.
///
/// The markdown reader produces one `Document` per section (text between
/// headings, horizontal rules, or an isolated code block / block quote).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier of the source, usually the resolved file path.
    pub id: String,
    /// The text content of the section.
    pub text: String,
    /// Key-value metadata associated with the section.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded-size unit of text stored in the vector index.
///
/// Chunks are immutable once inserted. Each insertion mints a fresh `id`,
/// so ingesting the same source twice stores two copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The identifier of the source document.
    pub document_id: String,
    /// Zero-based position of the chunk within its ingestion run.
    pub ordinal: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Key-value metadata inherited from the source section.
    pub metadata: HashMap<String, String>,
    /// The vector embedding for this chunk's text.
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
