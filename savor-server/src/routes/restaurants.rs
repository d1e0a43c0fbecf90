//! `/api/restaurants`: recommendations, dish generation and dining chat.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use savor_model::PromptTemplate;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult, require};
use crate::extract::{ApiJson, ConversationId};
use crate::models::{Dish, RecommendationRequest, Restaurant};
use crate::prompts::{self, FALLBACK_ANY, FALLBACK_NONE, join_or_fallback, or_fallback};
use crate::state::AppState;

pub const DEFAULT_DISH_COUNT: i64 = 5;
pub const MAX_DISH_COUNT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/dishes/generate", post(generate_dishes))
        .route("/advice", post(advice))
        .route("/chat", post(chat))
        .route("/{id}/details", get(details))
}

#[derive(Debug, Deserialize)]
pub struct DishRequest {
    pub cuisine: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub language: Option<String>,
}

async fn recommend(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecommendationRequest>,
) -> ApiResult<Json<Vec<Restaurant>>> {
    let group_size = request
        .group_size
        .map(|n| n.to_string())
        .unwrap_or_else(|| prompts::FALLBACK_GROUP_SIZE.to_string());
    let values = HashMap::from([
        ("location", or_fallback(request.location.as_deref(), prompts::FALLBACK_LOCATION)),
        ("cuisine", or_fallback(request.cuisine.as_deref(), FALLBACK_ANY)),
        ("priceRange", or_fallback(request.price_range.as_deref(), FALLBACK_ANY)),
        (
            "dietaryRestrictions",
            join_or_fallback(request.dietary_restrictions.as_deref(), FALLBACK_NONE),
        ),
        ("occasion", or_fallback(request.occasion.as_deref(), prompts::FALLBACK_OCCASION)),
        ("groupSize", group_size),
        ("timeOfDay", or_fallback(request.time_of_day.as_deref(), prompts::FALLBACK_TIME_OF_DAY)),
        ("preferences", join_or_fallback(request.preferences.as_deref(), FALLBACK_NONE)),
    ]);
    let prompt = PromptTemplate::new(prompts::RECOMMEND).render(&values)?;

    let restaurants: Vec<Restaurant> = state.generation.generate_structured(&prompt).await?;
    info!(
        location = %values["location"],
        result_count = restaurants.len(),
        "recommended restaurants"
    );
    Ok(Json(restaurants))
}

async fn generate_dishes(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DishRequest>,
) -> ApiResult<Json<Vec<Dish>>> {
    let cuisine = require(request.cuisine.as_deref(), "cuisine")?;
    let count = request.count.unwrap_or(DEFAULT_DISH_COUNT).clamp(1, MAX_DISH_COUNT);

    let count_text = count.to_string();
    let values = HashMap::from([("cuisine", cuisine), ("count", count_text.as_str())]);
    let prompt = PromptTemplate::new(prompts::DISHES).render(&values)?;

    let dishes: Vec<Dish> = state.generation.generate_structured(&prompt).await?;
    info!(cuisine, requested = count, result_count = dishes.len(), "generated dishes");
    Ok(Json(dishes))
}

async fn advice(
    State(state): State<AppState>,
    ConversationId(conversation): ConversationId,
    ApiJson(request): ApiJson<AdviceRequest>,
) -> ApiResult<String> {
    let query = require(request.query.as_deref(), "query")?;
    let prompt = PromptTemplate::new(prompts::ADVICE).render(&HashMap::from([("query", query)]))?;

    let memory = state.memories.session(&conversation).await;
    let mut memory = memory.lock().await;
    let advice = state.generation.generate(&prompt, Some(&mut *memory)).await?;
    info!(conversation = %conversation, "answered dining advice request");
    Ok(advice)
}

async fn chat(
    State(state): State<AppState>,
    ConversationId(conversation): ConversationId,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<String> {
    let message = require(request.message.as_deref(), "message")?;
    let instruction = prompts::chat_system_instruction(request.language.as_deref());
    let prompt = PromptTemplate::new(prompts::CHAT).render(&HashMap::from([("message", message)]))?;

    let memory = state.memories.session(&conversation).await;
    let mut memory = memory.lock().await;
    let reply = state
        .generation
        .generate_with_instruction(instruction, &prompt, Some(&mut *memory))
        .await?;
    info!(
        conversation = %conversation,
        language = request.language.as_deref().unwrap_or("zh"),
        "answered chat message"
    );
    Ok(reply)
}

async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Restaurant>> {
    let id: i64 = id.trim().parse().map_err(|_| {
        ApiError::Validation(format!("restaurant id must be an integer, got '{id}'"))
    })?;
    let id_text = id.to_string();
    let prompt =
        PromptTemplate::new(prompts::DETAILS).render(&HashMap::from([("id", id_text.as_str())]))?;

    let restaurant: Restaurant = state.generation.generate_structured(&prompt).await?;
    info!(id, name = %restaurant.name, "generated restaurant details");
    Ok(Json(restaurant))
}
