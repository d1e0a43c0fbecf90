//! Ingest-and-search scenarios for the RAG pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use savor_rag::{
    Chunk, Document, DocumentLoader, EmbeddingProvider, HashEmbeddingProvider,
    InMemoryVectorStore, MetadataFilter, Predicate, RagConfig, RagError, RagPipeline,
    SearchResult, VectorStore,
};

const TWO_SECTIONS: &str = concat!(
    "# Sichuan House\n\nMapo tofu and dan dan noodles, very spicy.\n\n",
    "---\n\nQuiet tea garden with dim sum on weekends.\n",
);

fn pipeline_at(dir: &std::path::Path) -> (RagPipeline, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .vector_store(store.clone())
        .loader(DocumentLoader::new(dir))
        .build()
        .unwrap();
    (pipeline, store)
}

#[tokio::test]
async fn two_chunk_document_then_search_returns_both() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), TWO_SECTIONS).unwrap();
    let (pipeline, _) = pipeline_at(dir.path());

    let count = pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap();
    assert_eq!(count, 2);

    let results = pipeline.search("x", 5, None).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn most_similar_chunk_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), TWO_SECTIONS).unwrap();
    let (pipeline, _) = pipeline_at(dir.path());
    pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap();

    let results = pipeline.search("spicy noodles", 1, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].chunk.text.contains("dan dan noodles"));
    assert_eq!(results[0].chunk.metadata.get("title").map(String::as_str), Some("Sichuan House"));
}

#[tokio::test]
async fn reingesting_duplicates_chunks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), TWO_SECTIONS).unwrap();
    let (pipeline, store) = pipeline_at(dir.path());

    pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap();
    pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap();
    assert_eq!(store.len().await.unwrap(), 4);
}

#[tokio::test]
async fn ordinals_run_across_sections() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), TWO_SECTIONS).unwrap();
    let (pipeline, store) = pipeline_at(dir.path());
    pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap();

    let mut ordinals: Vec<usize> = store
        .search(&[0.0; 256], 10, None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.chunk.ordinal)
        .collect();
    ordinals.sort_unstable();
    assert_eq!(ordinals, [0, 1]);
}

#[tokio::test]
async fn extra_metadata_constrains_filtered_search() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("chengdu.md"), "Hot pot by the river, open late.").unwrap();
    std::fs::write(dir.path().join("canton.md"), "Hot pot with clear broth, open late.").unwrap();
    let (pipeline, _) = pipeline_at(dir.path());

    let chengdu = HashMap::from([("location".to_string(), "Chengdu".to_string())]);
    let canton = HashMap::from([("location".to_string(), "Guangzhou".to_string())]);
    pipeline.ingest_path("chengdu.md", &chengdu).await.unwrap();
    pipeline.ingest_path("canton.md", &canton).await.unwrap();

    let filter = MetadataFilter::new().and(Predicate::contains("location", "guangzhou"));
    let results = pipeline.search("hot pot", 5, Some(&filter)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].chunk.text.contains("clear broth"));
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, store) = pipeline_at(dir.path());

    let err = pipeline.ingest_path("nope.md", &HashMap::new()).await.unwrap_err();
    assert!(matches!(err, RagError::NotFound { .. }));
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn blank_query_and_zero_k_are_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline_at(dir.path());

    assert!(matches!(
        pipeline.search("  ", 5, None).await.unwrap_err(),
        RagError::InvalidArgument(_)
    ));
    assert!(matches!(
        pipeline.search("tofu", 0, None).await.unwrap_err(),
        RagError::InvalidArgument(_)
    ));
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> savor_rag::Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "test".into(), message: "quota exceeded".into() })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

#[tokio::test]
async fn embedding_failure_is_downstream_and_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), TWO_SECTIONS).unwrap();
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(FailingEmbedder))
        .vector_store(store.clone())
        .loader(DocumentLoader::new(dir.path()))
        .build()
        .unwrap();

    let err = pipeline.ingest_path("guide.md", &HashMap::new()).await.unwrap_err();
    assert!(err.is_downstream());
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(store.len().await.unwrap(), 0);
}

struct BrokenStore;

#[async_trait]
impl VectorStore for BrokenStore {
    async fn insert(&self, _chunks: &[Chunk]) -> savor_rag::Result<()> {
        Ok(())
    }

    async fn delete(&self, _ids: &[&str]) -> savor_rag::Result<()> {
        Ok(())
    }

    async fn clear(&self) -> savor_rag::Result<()> {
        Err(RagError::VectorStore { backend: "broken".into(), message: "offline".into() })
    }

    async fn len(&self) -> savor_rag::Result<usize> {
        Ok(0)
    }

    async fn search(
        &self,
        _embedding: &[f32],
        _top_k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> savor_rag::Result<Vec<SearchResult>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn clear_is_best_effort() {
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .vector_store(Arc::new(BrokenStore))
        .build()
        .unwrap();

    assert!(!pipeline.clear().await);
}

#[test]
fn builder_requires_collaborators() {
    let err = RagPipeline::builder().build().err().expect("missing collaborators");
    assert!(matches!(err, RagError::Config(_)));
}

/// Embeds each known text as a fixed vector.
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new<'a>(entries: impl IntoIterator<Item = (&'a str, Vec<f32>)>) -> Self {
        Self { vectors: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect() }
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> savor_rag::Result<Vec<f32>> {
        self.vectors.get(text).cloned().ok_or_else(|| RagError::Embedding {
            provider: "table".into(),
            message: format!("no vector for {text:?}"),
        })
    }

    fn dimensions(&self) -> usize {
        self.vectors.values().next().map_or(0, Vec::len)
    }
}

fn table_pipeline(embedder: TableEmbedder, config: RagConfig) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn negatively_scored_chunks_are_still_returned() {
    let embedder = TableEmbedder::new([
        ("where to eat", vec![1.0, 0.0]),
        ("Late-night congee stall", vec![-1.0, 0.2]),
    ]);
    let pipeline = table_pipeline(embedder, RagConfig::default());
    let stored = pipeline
        .ingest_documents(&[Document::new("night.md", "Late-night congee stall")])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    let results = pipeline.search("where to eat", 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].score < 0.0);
}

#[tokio::test]
async fn configured_threshold_drops_weak_matches() {
    let embedder = TableEmbedder::new([
        ("where to eat", vec![1.0, 0.0]),
        ("Noodle bar by the station", vec![0.9, 0.1]),
        ("Late-night congee stall", vec![-1.0, 0.2]),
    ]);
    let config = RagConfig::builder().similarity_threshold(0.5).build().unwrap();
    let pipeline = table_pipeline(embedder, config);
    pipeline
        .ingest_documents(&[
            Document::new("noodles.md", "Noodle bar by the station"),
            Document::new("night.md", "Late-night congee stall"),
        ])
        .await
        .unwrap();

    let results = pipeline.search("where to eat", 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.text, "Noodle bar by the station");
}

fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
        .prop_filter("non-zero embedding", |v| v.iter().any(|x| x.abs() > 1e-3))
}

/// *For any* embeddings, including ones scoring negatively against the
/// query, pipeline search SHALL return `min(top_k, stored)` results in
/// non-increasing score order.
mod prop_pipeline_search_length {
    use super::*;

    const DIM: usize = 4;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn search_returns_min_k_n_in_order(
            vectors in proptest::collection::vec(arb_embedding(DIM), 1..12),
            query in arb_embedding(DIM),
            top_k in 1usize..16,
        ) {
            let texts: Vec<String> =
                (0..vectors.len()).map(|i| format!("dining note {i}")).collect();
            let embedder = TableEmbedder::new(
                texts
                    .iter()
                    .map(String::as_str)
                    .zip(vectors.iter().cloned())
                    .chain([("query", query.clone())]),
            );
            let documents: Vec<Document> =
                texts.iter().map(|t| Document::new("notes.md", t.as_str())).collect();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let pipeline = table_pipeline(embedder, RagConfig::default());
                pipeline.ingest_documents(&documents).await.unwrap();
                pipeline.search("query", top_k, None).await.unwrap()
            });

            prop_assert_eq!(results.len(), top_k.min(vectors.len()));
            for window in results.windows(2) {
                prop_assert!(window[0].score >= window[1].score);
            }
        }
    }
}
