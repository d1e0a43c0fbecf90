//! Prompt templates used by the handlers.
//!
//! Optional request fields are replaced with the explicit fallbacks below
//! before rendering; templates never supply their own defaults.

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are a professional restaurant recommendation assistant. \
Give accurate, useful recommendations for restaurants and dishes.";

pub const CHAT_SYSTEM_EN: &str =
    "You are a helpful restaurant recommendation assistant. Answer in English.";
pub const CHAT_SYSTEM_ZH: &str = "你是一个专业的餐厅推荐助手。请用中文回答。";

pub const FALLBACK_LOCATION: &str = "Beijing";
pub const FALLBACK_ANY: &str = "any";
pub const FALLBACK_NONE: &str = "none";
pub const FALLBACK_OCCASION: &str = "everyday dining";
pub const FALLBACK_GROUP_SIZE: &str = "1-2 people";
pub const FALLBACK_TIME_OF_DAY: &str = "lunch";

pub const RECOMMEND: &str = "\
Recommend 5 suitable restaurants for the following preferences:
Location: {location}
Cuisine: {cuisine}
Price range: {priceRange}
Dietary restrictions: {dietaryRestrictions}
Occasion: {occasion}
Group size: {groupSize}
Time of day: {timeOfDay}
Other preferences: {preferences}

Include each restaurant's name, cuisine, location, rating, description, price range and features, \
sorted by rating from highest to lowest.
Do not include any explanation; return only the restaurant data as JSON.";

pub const DISHES: &str = "\
Create {count} signature dishes of {cuisine} cuisine with the following information:
- dish name
- detailed description
- main ingredients
- price
- category (appetizer, main course, dessert, ...)
- dietary information (vegetarian, gluten-free, low-calorie, ...)
- calories
- preparation time
- difficulty

Return the dishes as JSON without any explanation.";

pub const ADVICE: &str = "\
As a professional restaurant advisor, answer the following question: {query}

Give practical, specific advice covering:
1. Which restaurant to choose
2. Dishes to order
3. When to go
4. Things to watch out for

Keep the answer concise, no more than 200 words.";

pub const CHAT: &str = "\
User question: {message}

Recommend relevant restaurants or give dining advice based on the question.";

pub const DETAILS: &str = "\
Generate detailed information for the restaurant with ID {id}, including:
- restaurant name
- cuisine
- exact location
- rating (1 to 5 stars)
- detailed description
- price range
- features (delivery, dine-in, private rooms, ...)

Return the restaurant as JSON.";

pub const STRUCTURED_LIST: &str = "\
Recommend 3 {cuisine} restaurants and return them as a JSON list.
Each restaurant has: name, cuisine, location, rating, description, priceRange, features";

pub const STRUCTURED_ONE: &str = "\
Recommend 1 {cuisine} restaurant and return it as JSON.
Include: name, cuisine, location, rating, description, priceRange, features";

pub const STRUCTURED_NAMES: &str = "Recommend 3 {cuisine} restaurants by name.";

pub const RAG_CHAT: &str = "\
Answer the user's question using the restaurant knowledge base below.

Knowledge base:
{context}

User question: {question}

Base the answer on the knowledge base and say clearly when it holds no relevant information.
Keep a professional, friendly tone and give practical suggestions.";

pub const RAG_PERSONALIZED: &str = "\
Answer the user's question using the restaurant knowledge base below, tailored to their preferences.

User preferences:
{preferences}

Knowledge base:
{context}

User question: {question}

Prefer options that match the user's preferences and say clearly when the knowledge base has none.";

pub const RAG_CONCISE: &str = "\
Answer the user's question using the restaurant knowledge base below. Keep the answer brief.

Knowledge base:
{context}

User question: {question}

Give an accurate, concise answer based on the knowledge base.";

/// The trimmed value, or `fallback` when absent or blank.
pub fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(fallback).to_string()
}

/// Comma-joined non-blank items, or `fallback` when there are none.
pub fn join_or_fallback(values: Option<&[String]>, fallback: &str) -> String {
    let items: Vec<&str> = values
        .unwrap_or_default()
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if items.is_empty() { fallback.to_string() } else { items.join(", ") }
}

/// System line for `/api/restaurants/chat`: English for `en`, Chinese otherwise.
pub fn chat_system_instruction(language: Option<&str>) -> &'static str {
    match language.map(str::trim) {
        Some(lang) if lang.eq_ignore_ascii_case("en") => CHAT_SYSTEM_EN,
        _ => CHAT_SYSTEM_ZH,
    }
}
