//! Converters from raw model text to typed values.
//!
//! Each converter contributes format instructions that are appended to the
//! prompt, and parses the reply. Parsing never yields a partially filled
//! value: any mismatch is a [`ModelError::Parse`].

use std::collections::HashMap;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Turns model output into a `T`.
pub trait OutputConverter: Send + Sync {
    type Output;

    /// Text appended to the prompt describing the expected reply format.
    fn format_instructions(&self) -> String;

    fn convert(&self, text: &str) -> Result<Self::Output>;
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop the info string (`json`, `JSON`, ...) on the opening line
    if let Some(newline) = body.find('\n') {
        return body[newline + 1..].trim();
    }
    // single line: an info word only counts when a JSON value follows it
    let body = body.trim();
    let after_info = body.trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim_start();
    if after_info.len() < body.len() && after_info.starts_with(['{', '[']) {
        after_info
    } else {
        body
    }
}

/// Parses a JSON reply into `T`, describing `T` with its JSON schema.
///
/// Unknown fields are ignored as long as `T` does not deny them.
pub struct JsonConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConverter<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutputConverter for JsonConverter<T>
where
    T: DeserializeOwned + JsonSchema,
{
    type Output = T;

    fn format_instructions(&self) -> String {
        let schema = schemars::schema_for!(T);
        let schema = serde_json::to_string_pretty(&schema).unwrap_or_default();
        format!(
            "Your response should be in JSON format.\n\
             Do not include any explanations, only provide a RFC8259 compliant JSON response \
             following this format without deviation.\n\
             Do not include markdown code blocks in your response.\n\
             Here is the JSON Schema instance your output must adhere to:\n```{schema}```"
        )
    }

    fn convert(&self, text: &str) -> Result<T> {
        serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            ModelError::Parse(format!("expected JSON matching the requested schema: {e}"))
        })
    }
}

/// Parses a comma-separated reply into trimmed, non-empty items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListConverter;

impl OutputConverter for ListConverter {
    type Output = Vec<String>;

    fn format_instructions(&self) -> String {
        concat!(
            "Respond with only a list of comma-separated values, ",
            "without any leading or trailing text.\n",
            "Example format: foo, bar, baz",
        )
        .to_string()
    }

    fn convert(&self, text: &str) -> Result<Vec<String>> {
        Ok(strip_code_fence(text)
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Parses a JSON object reply into a string-keyed map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapConverter;

impl OutputConverter for MapConverter {
    type Output = HashMap<String, Value>;

    fn format_instructions(&self) -> String {
        "Your response should be in JSON format.\n\
         The JSON must be a single object with string keys.\n\
         Do not include any explanations, only provide a RFC8259 compliant JSON response \
         following this format without deviation.\n\
         Remove the ```json markdown surrounding the output including the trailing \"```\"."
            .to_string()
    }

    fn convert(&self, text: &str) -> Result<HashMap<String, Value>> {
        serde_json::from_str(strip_code_fence(text))
            .map_err(|e| ModelError::Parse(format!("expected a JSON object: {e}")))
    }
}
