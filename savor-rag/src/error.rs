//! Error types for the `savor-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting documents or retrieving chunks.
#[derive(Debug, Error)]
pub enum RagError {
    /// The referenced document could not be resolved to a readable file.
    #[error("Document not found: {}", path.display())]
    NotFound {
        /// The path after resolution against the document root.
        path: PathBuf,
    },

    /// The document content could not be interpreted as the expected markup.
    #[error("Unsupported document format ({}): {message}", path.display())]
    Format {
        /// The offending document.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A caller-supplied argument was rejected before reaching the index.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Returns `true` for failures of an external collaborator (embedding or index).
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::VectorStore { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
