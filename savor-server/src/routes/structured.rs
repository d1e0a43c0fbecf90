//! `/api/structured`: the same request answered through each output converter.

use std::collections::HashMap;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use savor_model::{JsonConverter, ListConverter, MapConverter, PromptTemplate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{ApiResult, require};
use crate::extract::ApiJson;
use crate::models::Restaurant;
use crate::prompts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants/type-ref", post(restaurants_typed))
        .route("/restaurant/bean-converter", post(restaurant_converter))
        .route("/restaurants/list-converter", post(restaurant_names))
        .route("/restaurant/map-converter", post(restaurant_map))
        .route("/restaurant/direct-entity", post(restaurant_direct))
}

#[derive(Debug, Deserialize)]
pub struct CuisineRequest {
    pub cuisine: Option<String>,
}

/// One entry of the list-converter response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRestaurant {
    pub name: String,
    pub cuisine: String,
}

fn cuisine_prompt(template: &str, request: &CuisineRequest) -> ApiResult<(String, String)> {
    let cuisine = require(request.cuisine.as_deref(), "cuisine")?;
    let prompt = PromptTemplate::new(template).render(&HashMap::from([("cuisine", cuisine)]))?;
    Ok((cuisine.to_string(), prompt))
}

async fn restaurants_typed(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CuisineRequest>,
) -> ApiResult<Json<Vec<Restaurant>>> {
    let (cuisine, prompt) = cuisine_prompt(prompts::STRUCTURED_LIST, &request)?;
    let restaurants: Vec<Restaurant> = state.generation.generate_structured(&prompt).await?;
    info!(
        cuisine = %cuisine,
        result_count = restaurants.len(),
        style = "type-ref",
        "structured output"
    );
    Ok(Json(restaurants))
}

async fn restaurant_converter(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CuisineRequest>,
) -> ApiResult<Json<Restaurant>> {
    let (cuisine, prompt) = cuisine_prompt(prompts::STRUCTURED_ONE, &request)?;
    let converter = JsonConverter::<Restaurant>::new();
    let restaurant = state.generation.generate_with_converter(&prompt, &converter).await?;
    info!(cuisine = %cuisine, style = "bean-converter", "structured output");
    Ok(Json(restaurant))
}

async fn restaurant_names(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CuisineRequest>,
) -> ApiResult<Json<Vec<NamedRestaurant>>> {
    let (cuisine, prompt) = cuisine_prompt(prompts::STRUCTURED_NAMES, &request)?;
    let names = state.generation.generate_with_converter(&prompt, &ListConverter).await?;
    let restaurants: Vec<NamedRestaurant> = names
        .into_iter()
        .map(|name| NamedRestaurant { name, cuisine: cuisine.clone() })
        .collect();
    info!(
        cuisine = %cuisine,
        result_count = restaurants.len(),
        style = "list-converter",
        "structured output"
    );
    Ok(Json(restaurants))
}

async fn restaurant_map(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CuisineRequest>,
) -> ApiResult<Json<HashMap<String, Value>>> {
    let (cuisine, prompt) = cuisine_prompt(prompts::STRUCTURED_ONE, &request)?;
    let restaurant = state.generation.generate_with_converter(&prompt, &MapConverter).await?;
    info!(
        cuisine = %cuisine,
        field_count = restaurant.len(),
        style = "map-converter",
        "structured output"
    );
    Ok(Json(restaurant))
}

async fn restaurant_direct(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CuisineRequest>,
) -> ApiResult<Json<Restaurant>> {
    let (cuisine, prompt) = cuisine_prompt(prompts::STRUCTURED_ONE, &request)?;
    let restaurant: Restaurant = state.generation.generate_structured(&prompt).await?;
    info!(cuisine = %cuisine, style = "direct-entity", "structured output");
    Ok(Json(restaurant))
}
