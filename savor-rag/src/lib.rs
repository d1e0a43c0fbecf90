//! # savor-rag
//!
//! Document ingestion and retrieval for the Savor service.
//!
//! ## Overview
//!
//! - [`DocumentLoader`] / [`MarkdownReader`] turn a markdown file into
//!   section [`Document`]s, split at headings and horizontal rules.
//! - [`TokenTextSplitter`] cuts sections into token-bounded [`Chunk`]s.
//! - [`EmbeddingProvider`] and [`VectorStore`] are the two external
//!   collaborators; [`HashEmbeddingProvider`] and [`InMemoryVectorStore`]
//!   are local implementations.
//! - [`RagPipeline`] ties them together: `ingest_path` and `search`.
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIEmbeddingProvider`] over `reqwest`.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod reader;
pub mod tokenizer;
pub mod vectorstore;

pub use chunking::{Chunker, TokenTextSplitter};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use filter::{FilterOp, MetadataFilter, Predicate};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use reader::{DocumentLoader, MarkdownReader, MarkdownReaderConfig};
pub use tokenizer::{Tokenizer, WordTokenizer};
pub use vectorstore::VectorStore;
