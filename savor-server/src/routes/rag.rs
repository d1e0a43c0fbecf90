//! `/api/rag`: document loading, similarity search and retrieval-augmented chat.

use std::collections::{BTreeMap, HashMap};

use axum::extract::State;
use axum::routing::{delete, post};
use axum::{Json, Router};
use savor_model::{PromptTemplate, assemble_context, assemble_within_budget};
use savor_rag::{MetadataFilter, Predicate, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult, require};
use crate::extract::{ApiJson, ConversationId};
use crate::prompts;
use crate::state::AppState;

/// Chunks retrieved for plain and personalized RAG chat.
pub const CHAT_TOP_K: usize = 5;
/// Chunks retrieved for the budgeted chat.
pub const CONTEXT_TOP_K: usize = 3;
pub const DEFAULT_MAX_CONTEXT_TOKENS: i64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/load", post(load))
        .route("/chat", post(chat))
        .route("/search", post(search))
        .route("/chat-personalized", post(chat_personalized))
        .route("/chat-context", post(chat_context))
        .route("/documents", delete(clear_documents))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub file_path: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub message: String,
    pub file_path: String,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: Option<String>,
    pub top_k: Option<i64>,
    pub filter: Option<MetadataFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub user_preferences: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChatRequest {
    pub message: Option<String>,
    pub max_tokens: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn chunk_texts(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.chunk.text.as_str()).collect()
}

/// Render a preference value for the prompt: strings as-is, lists comma-joined.
fn preference_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items.iter().map(preference_text).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `contains` predicates for every filterable preference with a non-blank text value.
fn preference_filter(state: &AppState, preferences: &BTreeMap<String, Value>) -> MetadataFilter {
    preferences
        .iter()
        .filter(|(key, _)| state.is_filterable(key))
        .filter_map(|(key, value)| match value {
            Value::String(s) if !s.trim().is_empty() => Some(Predicate::contains(key, s.trim())),
            _ => None,
        })
        .fold(MetadataFilter::new(), MetadataFilter::and)
}

async fn load(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoadRequest>,
) -> ApiResult<Json<LoadResponse>> {
    let file_path = require(request.file_path.as_deref(), "filePath")?;
    info!(file_path, "loading document");

    let chunks = state.pipeline.ingest_path(file_path, &request.metadata).await?;
    Ok(Json(LoadResponse {
        message: "document loaded".to_string(),
        file_path: file_path.to_string(),
        chunks,
    }))
}

async fn chat(
    State(state): State<AppState>,
    ConversationId(conversation): ConversationId,
    body: String,
) -> ApiResult<String> {
    let question = require(Some(body.as_str()), "message")?;
    let results = state.pipeline.search(question, CHAT_TOP_K, None).await?;

    let context = assemble_context(&chunk_texts(&results));
    let values = HashMap::from([("context", context.as_str()), ("question", question)]);
    let prompt = PromptTemplate::new(prompts::RAG_CHAT).render(&values)?;

    let memory = state.memories.session(&conversation).await;
    let mut memory = memory.lock().await;
    let reply = state.generation.generate(&prompt, Some(&mut *memory)).await?;
    info!(conversation = %conversation, retrieved = results.len(), "answered RAG chat");
    Ok(reply)
}

async fn search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let query = require(request.query.as_deref(), "query")?;
    let top_k = match request.top_k {
        None => state.pipeline.config().top_k,
        Some(top_k) => usize::try_from(top_k)
            .map_err(|_| ApiError::Validation(format!("topK must be at least 1, got {top_k}")))?,
    };

    let filter = request.filter.filter(|f| !f.is_empty());
    let results = state.pipeline.search(query, top_k, filter.as_ref()).await?;
    info!(top_k, filtered = filter.is_some(), result_count = results.len(), "similarity search");
    Ok(Json(results))
}

async fn chat_personalized(
    State(state): State<AppState>,
    ConversationId(conversation): ConversationId,
    ApiJson(request): ApiJson<PersonalizedChatRequest>,
) -> ApiResult<String> {
    let message = require(request.message.as_deref(), "message")?;

    let filter = preference_filter(&state, &request.user_preferences);
    let results = state
        .pipeline
        .search(message, CHAT_TOP_K, (!filter.is_empty()).then_some(&filter))
        .await?;

    let preferences: Vec<String> = request
        .user_preferences
        .iter()
        .map(|(key, value)| (key, preference_text(value)))
        .filter(|(_, text)| !text.is_empty())
        .map(|(key, text)| format!("- {key}: {text}"))
        .collect();
    let preferences = if preferences.is_empty() {
        prompts::FALLBACK_NONE.to_string()
    } else {
        preferences.join("\n")
    };

    let context = assemble_context(&chunk_texts(&results));
    let values = HashMap::from([
        ("preferences", preferences.as_str()),
        ("context", context.as_str()),
        ("question", message),
    ]);
    let prompt = PromptTemplate::new(prompts::RAG_PERSONALIZED).render(&values)?;

    let memory = state.memories.session(&conversation).await;
    let mut memory = memory.lock().await;
    let reply = state.generation.generate(&prompt, Some(&mut *memory)).await?;
    info!(
        conversation = %conversation,
        predicates = filter.clauses.len(),
        retrieved = results.len(),
        "answered personalized RAG chat"
    );
    Ok(reply)
}

async fn chat_context(
    State(state): State<AppState>,
    ConversationId(conversation): ConversationId,
    ApiJson(request): ApiJson<ContextChatRequest>,
) -> ApiResult<String> {
    let message = require(request.message.as_deref(), "message")?;
    let max_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_CONTEXT_TOKENS);
    let max_tokens = usize::try_from(max_tokens).map_err(|_| {
        ApiError::Validation(format!("maxTokens must not be negative, got {max_tokens}"))
    })?;

    let results = state.pipeline.search(message, CONTEXT_TOP_K, None).await?;
    let tokenizer = state.tokenizer.clone();
    let context =
        assemble_within_budget(&chunk_texts(&results), max_tokens, |text| tokenizer.count(text));
    let values = HashMap::from([("context", context.as_str()), ("question", message)]);
    let prompt = PromptTemplate::new(prompts::RAG_CONCISE).render(&values)?;

    let memory = state.memories.session(&conversation).await;
    let mut memory = memory.lock().await;
    let reply = state.generation.generate(&prompt, Some(&mut *memory)).await?;
    info!(
        conversation = %conversation,
        max_tokens,
        retrieved = results.len(),
        context_tokens = state.tokenizer.count(&context),
        "answered budgeted RAG chat"
    );
    Ok(reply)
}

async fn clear_documents(State(state): State<AppState>) -> Json<MessageResponse> {
    let message = if state.pipeline.clear().await {
        "vector store cleared"
    } else {
        "vector store could not be cleared; see server logs"
    };
    Json(MessageResponse { message: message.to_string() })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn preference_values_render_as_text() {
        assert_eq!(preference_text(&json!(" Chengdu ")), "Chengdu");
        assert_eq!(preference_text(&json!(["spicy", "quiet"])), "spicy, quiet");
        assert_eq!(preference_text(&json!(4)), "4");
        assert_eq!(preference_text(&Value::Null), "");
    }
}
