//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;
use crate::filter::MetadataFilter;

/// A storage backend for embedded chunks with similarity search.
///
/// The index is append-friendly: inserting a chunk whose id already exists
/// is allowed but ingestion always mints fresh ids. Implementations own any
/// locking their storage needs; callers add none.
///
/// # Example
///
/// ```rust,ignore
/// use savor_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.insert(&chunks).await?;
/// let results = store.search(&query_embedding, 5, None).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks. Chunks must have embeddings set.
    async fn insert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs. Unknown IDs are ignored.
    async fn delete(&self, ids: &[&str]) -> Result<()>;

    /// Remove every stored chunk.
    async fn clear(&self) -> Result<()>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize>;

    /// Search for the `top_k` chunks most similar to `embedding`.
    ///
    /// When `filter` is given, only chunks whose metadata satisfies it are
    /// considered. Returns results ordered by descending similarity score.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>>;
}
