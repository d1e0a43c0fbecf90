//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use proptest::prelude::*;
use savor_rag::document::Chunk;
use savor_rag::filter::{MetadataFilter, Predicate};
use savor_rag::inmemory::InMemoryVectorStore;
use savor_rag::vectorstore::VectorStore;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding and a two-valued `cuisine` tag.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim), any::<bool>()).prop_map(
        |(id, text, embedding, spicy)| Chunk {
            id,
            document_id: "menu.md".to_string(),
            ordinal: 0,
            text,
            metadata: HashMap::from([(
                "cuisine".to_string(),
                if spicy { "sichuan" } else { "cantonese" }.to_string(),
            )]),
            embedding,
        },
    )
}

/// *For any* set of chunks stored in an InMemoryVectorStore, searching SHALL
/// return exactly `min(top_k, stored)` results ordered by non-increasing
/// cosine similarity.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_sized_min_k_n(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.insert(&chunks).await.unwrap();
                store.search(&query, top_k, None).await.unwrap()
            });

            prop_assert_eq!(results.len(), top_k.min(chunks.len()));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn filtered_results_only_contain_matching_chunks(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let filter = MetadataFilter::new().and(Predicate::eq("cuisine", "sichuan"));
            let matching = chunks
                .iter()
                .filter(|c| c.metadata.get("cuisine").map(String::as_str) == Some("sichuan"))
                .count();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.insert(&chunks).await.unwrap();
                store.search(&query, top_k, Some(&filter)).await.unwrap()
            });

            prop_assert_eq!(results.len(), top_k.min(matching));
            for result in &results {
                prop_assert_eq!(
                    result.chunk.metadata.get("cuisine").map(String::as_str),
                    Some("sichuan")
                );
            }
        }
    }
}
