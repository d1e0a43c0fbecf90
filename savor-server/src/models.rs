//! Entities the model is asked to produce, and the recommendation request.
//!
//! JSON field names are camelCase. Only the fields a caller cannot do
//! without are required; a reply missing one of them is rejected as a whole.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    /// 1.0 to 5.0
    pub rating: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Appetizer, main course, dessert, ...
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Vegetarian, gluten-free, low-calorie, ...
    #[serde(default)]
    pub dietary_info: Option<String>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub preparation_time: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Diner preferences for `/api/restaurants/recommend`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub occasion: Option<String>,
    pub group_size: Option<u32>,
    pub time_of_day: Option<String>,
    pub preferences: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn restaurant_uses_camel_case_and_defaults_features() {
        let restaurant: Restaurant = serde_json::from_value(json!({
            "name": "Quanjude",
            "cuisine": "Beijing",
            "location": "Qianmen",
            "rating": 4.5,
            "priceRange": "$$",
            "unknown": "ignored"
        }))
        .unwrap();
        assert_eq!(restaurant.price_range.as_deref(), Some("$$"));
        assert!(restaurant.features.is_empty());
        assert_eq!(serde_json::to_value(&restaurant).unwrap()["priceRange"], "$$");
    }

    #[test]
    fn restaurant_without_rating_is_rejected() {
        let parsed = serde_json::from_value::<Restaurant>(json!({
            "name": "Quanjude",
            "cuisine": "Beijing",
            "location": "Qianmen"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn dish_requires_name_and_description() {
        let dish: Dish = serde_json::from_value(json!({
            "name": "Mapo Tofu",
            "description": "Silken tofu in chili bean sauce",
            "dietaryInfo": "vegetarian option",
            "calories": 420
        }))
        .unwrap();
        assert_eq!(dish.calories, Some(420));
        assert!(serde_json::from_value::<Dish>(json!({ "name": "Mapo Tofu" })).is_err());
    }

    #[test]
    fn empty_recommendation_request_is_valid() {
        let request: RecommendationRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, RecommendationRequest::default());
    }
}
