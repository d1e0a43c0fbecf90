//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates ingestion (load → chunk → embed → insert)
//! and retrieval (embed → search → optional threshold) by composing a
//! [`DocumentLoader`], a [`Chunker`], an [`EmbeddingProvider`] and a
//! [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use savor_rag::{RagPipeline, RagConfig, InMemoryVectorStore, HashEmbeddingProvider};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .loader(DocumentLoader::new("./resources"))
//!     .build()?;
//!
//! let count = pipeline.ingest_path("classpath:restaurants.md", &HashMap::new()).await?;
//! let results = pipeline.search("quiet place for a business dinner", 5, None).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, TokenTextSplitter};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::reader::DocumentLoader;
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. The pipeline holds no
/// mutable state of its own; concurrent ingestion and search are only as
/// serialized as the [`VectorStore`] makes them.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    loader: DocumentLoader,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Load the document at `path`, split it, and store every chunk.
    ///
    /// Returns the number of chunks inserted. Ingesting the same path again
    /// inserts a second copy of every chunk.
    ///
    /// # Errors
    ///
    /// [`RagError::NotFound`] / [`RagError::Format`] from loading, or a
    /// downstream embedding / vector store error.
    pub async fn ingest_path(
        &self,
        path: &str,
        extra_metadata: &HashMap<String, String>,
    ) -> Result<usize> {
        let documents = self.loader.load(path, extra_metadata).await?;
        info!(path, section_count = documents.len(), "loaded document");
        let chunks = self.ingest_documents(&documents).await?;
        Ok(chunks.len())
    }

    /// Ingest already-loaded sections through chunk → embed → insert.
    ///
    /// Ordinals run across all sections in the order given. Returns the
    /// chunks that were stored (with embeddings attached).
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks: Vec<Chunk> =
            documents.iter().flat_map(|document| self.chunker.chunk(document)).collect();
        for (ordinal, chunk) in chunks.iter_mut().enumerate() {
            chunk.ordinal = ordinal;
        }
        if chunks.is_empty() {
            info!(chunk_count = 0, "ingested documents (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
            e
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: "pipeline".to_string(),
                message: format!(
                    "expected {} embeddings, provider returned {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.insert(&chunks).await.map_err(|e| {
            error!(error = %e, "insert failed during ingestion");
            e
        })?;

        info!(chunk_count = chunks.len(), "ingested documents");
        Ok(chunks)
    }

    /// Return up to `top_k` chunks most similar to `query`.
    ///
    /// Results are ordered by non-increasing score. Without a configured
    /// `similarity_threshold` the result holds `min(top_k, candidates)`
    /// chunks; with one, lower-scoring chunks are dropped. With a `filter`,
    /// only chunks whose metadata satisfies it are candidates.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidArgument`] if `query` is blank or `top_k` is zero.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidArgument("query must not be empty".to_string()));
        }
        if top_k == 0 {
            return Err(RagError::InvalidArgument("top_k must be at least 1".to_string()));
        }

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during search");
            e
        })?;

        let results =
            self.vector_store.search(&query_embedding, top_k, filter).await.map_err(|e| {
                error!(error = %e, "vector store search failed");
                e
            })?;

        let filtered: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(
            top_k,
            filtered = filter.is_some(),
            result_count = filtered.len(),
            "search completed"
        );
        Ok(filtered)
    }

    /// Remove every chunk from the index.
    ///
    /// Best effort: a failure is logged and reported as `false`.
    pub async fn clear(&self) -> bool {
        match self.vector_store.clear().await {
            Ok(()) => {
                info!("vector store cleared");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to clear vector store");
                false
            }
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. The chunker
/// defaults to a [`TokenTextSplitter`] built from the config, the loader to
/// a [`DocumentLoader`] rooted at the working directory.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    loader: Option<DocumentLoader>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(TokenTextSplitter::from_config(&config)));
        let loader = self.loader.unwrap_or_else(|| DocumentLoader::new("."));

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, loader })
    }
}
