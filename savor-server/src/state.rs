use std::sync::Arc;

use savor_model::{GenerationClient, MemoryStore};
use savor_rag::{RagPipeline, Tokenizer, WordTokenizer};

use crate::config::DEFAULT_FILTERABLE_FIELDS;

/// Collaborators shared by every handler, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub generation: GenerationClient,
    pub pipeline: Arc<RagPipeline>,
    pub memories: MemoryStore,
    /// Counts tokens for the context budget of `/api/rag/chat-context`.
    pub tokenizer: Arc<dyn Tokenizer>,
    /// Preference keys that become metadata predicates in personalized chat.
    pub filterable_fields: Arc<[String]>,
}

impl AppState {
    pub fn new(generation: GenerationClient, pipeline: Arc<RagPipeline>) -> Self {
        Self {
            generation,
            pipeline,
            memories: MemoryStore::default(),
            tokenizer: Arc::new(WordTokenizer),
            filterable_fields: DEFAULT_FILTERABLE_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with_memories(mut self, memories: MemoryStore) -> Self {
        self.memories = memories;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_filterable_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.filterable_fields = fields.into_iter().collect();
        self
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable_fields.iter().any(|f| f == field)
    }
}
