//! HTTP error type shared by every handler.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use savor_model::ModelError;
use savor_rag::RagError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, blank or malformed client input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A document could not be read as markdown.
    #[error("{0}")]
    Format(String),

    /// Model output did not match the requested shape, or a template was incomplete.
    #[error("{0}")]
    Parse(String),

    /// The model, embedding provider or index failed.
    #[error("{0}")]
    Downstream(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Format(_) | ApiError::Parse(_) | ApiError::Downstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Reject a missing or blank required field.
pub fn require<'a>(value: Option<&'a str>, field: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::Validation(format!("{field} must not be empty"))),
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RagError::InvalidArgument(msg) => ApiError::Validation(msg),
            RagError::Format { .. } => ApiError::Format(err.to_string()),
            RagError::Embedding { .. } | RagError::VectorStore { .. } | RagError::Config(_) => {
                ApiError::Downstream(err.to_string())
            }
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Template(_) | ModelError::Parse(_) => ApiError::Parse(err.to_string()),
            ModelError::Downstream { .. } | ModelError::Config(_) => {
                ApiError::Downstream(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
