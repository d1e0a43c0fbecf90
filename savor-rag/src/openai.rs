//! OpenAI-compatible embeddings over `reqwest`.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Upper bound on inputs per `/embeddings` request.
const MAX_INPUTS_PER_REQUEST: usize = 2048;

const PROVIDER: &str = "OpenAI";

/// Output width of the hosted embedding models; unknown models are assumed
/// to match `text-embedding-3-small`.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// An [`EmbeddingProvider`] calling an OpenAI-compatible `/embeddings` endpoint.
///
/// Chunk batches larger than the per-request input limit are sent as
/// several requests; vectors come back in input order regardless of the
/// order the server lists them in.
///
/// ```rust,ignore
/// let embedder = OpenAIEmbeddingProvider::new(api_key)?
///     .with_model("text-embedding-3-small")
///     .with_base_url("http://localhost:11434/v1");
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Config("OpenAI API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: model_dimensions(DEFAULT_EMBEDDING_MODEL),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = model_dimensions(&self.model);
        self
    }

    /// Target an OpenAI-compatible server; a trailing `/` is ignored.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn downstream(message: String) -> RagError {
        RagError::Embedding { provider: PROVIDER.into(), message }
    }

    async fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest { model: &self.model, input: inputs };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::downstream(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(Self::downstream(format!("API returned {status}: {detail}")));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::downstream(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != inputs.len() {
            return Err(Self::downstream(format!(
                "expected {} embeddings, API returned {}",
                inputs.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])
            .await?
            .pop()
            .ok_or_else(|| Self::downstream("API returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_INPUTS_PER_REQUEST) {
            debug!(
                provider = PROVIDER,
                model = %self.model,
                batch_size = batch.len(),
                "embedding batch"
            );
            embeddings.extend(self.request(batch).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/")
    }

    /// Answers with one vector per input, `[len, position]`, listed in reverse order.
    async fn reversed_embeddings(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(headers["authorization"], "Bearer test-key");
        assert_eq!(body["model"], "text-embedding-3-large");
        let inputs = body["input"].as_array().cloned().unwrap_or_default();
        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(i, input)| {
                let len = input.as_str().unwrap_or_default().len();
                json!({"index": i, "embedding": [len as f32, i as f32]})
            })
            .collect();
        Json(json!({"data": data}))
    }

    #[tokio::test]
    async fn batch_embeddings_follow_input_order() {
        let base = serve(Router::new().route("/v1/embeddings", post(reversed_embeddings))).await;
        let provider = OpenAIEmbeddingProvider::new("test-key")
            .unwrap()
            .with_model("text-embedding-3-large")
            .with_base_url(base);

        let vectors = provider.embed_batch(&["a", "bbb", "cc"]).await.unwrap();
        assert_eq!(vectors, [vec![1.0, 0.0], vec![3.0, 1.0], vec![2.0, 2.0]]);
        assert_eq!(provider.embed("dddd").await.unwrap(), [4.0, 0.0]);
        assert_eq!(provider.dimensions(), 3072);
    }

    #[tokio::test]
    async fn api_error_message_is_reported() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "quota exceeded"}})),
                )
            }),
        );
        let provider =
            OpenAIEmbeddingProvider::new("test-key").unwrap().with_base_url(serve(app).await);

        let err = provider.embed("hot pot").await.unwrap_err();
        assert!(err.is_downstream());
        assert!(err.to_string().contains("quota exceeded"), "{err}");
    }

    #[tokio::test]
    async fn short_response_is_rejected() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({"data": [{"index": 0, "embedding": [1.0]}]})) }),
        );
        let provider =
            OpenAIEmbeddingProvider::new("test-key").unwrap().with_base_url(serve(app).await);

        let err = provider.embed_batch(&["one", "two"]).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding { .. }));
    }

    #[test]
    fn empty_key_is_a_config_error() {
        assert!(matches!(OpenAIEmbeddingProvider::new("  "), Err(RagError::Config(_))));
    }
}
