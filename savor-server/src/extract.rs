//! Request extractors with the service's error conventions.

use std::convert::Infallible;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use savor_model::DEFAULT_CONVERSATION_ID;

use crate::error::ApiError;

/// Header naming the conversation whose memory a request reads and extends.
pub const CONVERSATION_HEADER: &str = "x-conversation-id";

/// `axum::Json` whose rejections are reported as [`ApiError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// The conversation id from [`CONVERSATION_HEADER`], or `default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationId(pub String);

impl<S> FromRequestParts<S> for ConversationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CONVERSATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONVERSATION_ID);
        Ok(Self(id.to_string()))
    }
}
