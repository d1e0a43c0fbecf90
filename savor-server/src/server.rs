use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use savor_model::{
    GenerationClient, GenerationConfig, LanguageModel, MemoryStore, MockLlm, OpenAIChatModel,
    OpenAIConfig,
};
use savor_rag::openai::OpenAIEmbeddingProvider;
use savor_rag::{
    DocumentLoader, EmbeddingProvider, HashEmbeddingProvider, InMemoryVectorStore, RagConfig,
    RagPipeline, TokenTextSplitter, Tokenizer, WordTokenizer,
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ModelProvider, ServerConfig};
use crate::prompts::DEFAULT_SYSTEM_INSTRUCTION;
use crate::routes;
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api/restaurants", routes::restaurants::router())
        .nest("/api/structured", routes::structured::router())
        .nest("/api/rag", routes::rag::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Construct the model, embedder, index and memory described by `config`.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let rag_config = RagConfig::builder()
        .chunk_size(config.chunk_tokens)
        .build()
        .context("invalid retrieval settings")?;

    let (model, embedder): (Arc<dyn LanguageModel>, Arc<dyn EmbeddingProvider>) =
        match config.provider {
            ModelProvider::Mock => {
                (Arc::new(MockLlm::new("mock")), Arc::new(HashEmbeddingProvider::default()))
            }
            ModelProvider::OpenAI => {
                let api_key = config
                    .openai_api_key
                    .clone()
                    .context("OPENAI_API_KEY must be set unless SAVOR_MODEL_PROVIDER=mock")?;
                let mut chat = OpenAIConfig::new(api_key.clone(), &config.chat_model);
                let mut embedder =
                    OpenAIEmbeddingProvider::new(api_key)?.with_model(&config.embedding_model);
                if let Some(base_url) = &config.openai_base_url {
                    chat = chat.with_base_url(base_url);
                    embedder = embedder.with_base_url(base_url);
                }
                (Arc::new(OpenAIChatModel::new(chat)?), Arc::new(embedder))
            }
        };

    // Chunking and the chat context budget count tokens the same way.
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(WordTokenizer);
    let chunker = TokenTextSplitter::from_config(&rag_config).with_tokenizer(tokenizer.clone());

    let pipeline = RagPipeline::builder()
        .config(rag_config)
        .chunker(Arc::new(chunker))
        .embedding_provider(embedder)
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .loader(DocumentLoader::new(config.document_root.clone()))
        .build()?;

    let generation = GenerationClient::new(model).with_config(
        GenerationConfig::default().with_system_instruction(DEFAULT_SYSTEM_INSTRUCTION),
    );

    Ok(AppState::new(generation, Arc::new(pipeline))
        .with_memories(
            MemoryStore::new(config.memory_max_turns)
                .with_max_sessions(config.memory_max_sessions),
        )
        .with_tokenizer(tokenizer)
        .with_filterable_fields(config.filterable_fields.iter().cloned()))
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for savor-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        provider = ?config.provider,
        chat_model = %config.chat_model,
        document_root = %config.document_root.display(),
        "savor-server listening on http://{}",
        addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({"status":"ok","service":"savor-server"}))
}
