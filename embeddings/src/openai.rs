//! Provider backed by the OpenAI embeddings API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Default API base URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: String,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Output dimensions requested when a request does not set its own.
    dimensions: Option<usize>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            client: reqwest::Client::new(),
            default_model: DEFAULT_OPENAI_MODEL.to_string(),
            dimensions: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the default output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(format!("cannot build http client: {e}")))?;
        Ok(self)
    }

    async fn call(&self, body: serde_json::Value) -> Result<OpenAIEmbeddingResponse> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            warn!("OpenAI embeddings rate limited, retry after {retry_after}s");
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "rate limited, retry after {retry_after}s"
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "API error {status}: {error_text}"
            )));
        }

        response.json::<OpenAIEmbeddingResponse>().await.map_err(|e| {
            EmbeddingError::ProviderUnavailable(format!("malformed API response: {e}"))
        })
    }

    fn body(&self, input: serde_json::Value, request: &EmbeddingRequest) -> serde_json::Value {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let mut body = serde_json::json!({
            "input": input,
            "model": model
        });
        if let Some(dims) = request.dimensions.or(self.dimensions) {
            body["dimensions"] = serde_json::json!(dims);
        }
        body
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        if let Some(dims) = self.dimensions {
            return dims;
        }
        match self.default_model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        request.validate()?;

        let body = self.body(serde_json::json!([request.text]), &request);
        debug!("Generating embedding with model: {}", body["model"]);

        let result = self.call(body).await?;
        let tokens_used = result.usage.as_ref().map(|u| u.total_tokens);
        let model = result.model;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::ProviderUnavailable("no embedding in response".to_string())
            })?
            .embedding;

        if embedding.is_empty() {
            return Err(EmbeddingError::ProviderUnavailable(
                "empty embedding in response".to_string(),
            ));
        }

        let dimension = embedding.len();
        info!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model,
            dimension,
            tokens_used,
        })
    }

    async fn embed_batch(
        &self,
        requests: Vec<EmbeddingRequest>,
    ) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        for request in &requests {
            request.validate()?;
        }

        // One API call carries a single model and output size.
        let first = &requests[0];
        let uniform = requests
            .iter()
            .all(|r| r.model == first.model && r.dimensions == first.dimensions);
        if !uniform {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.embed(request).await?);
            }
            return Ok(results);
        }

        let texts: Vec<&str> = requests.iter().map(|r| r.text.as_str()).collect();
        debug!("Generating batch embeddings for {} texts", texts.len());

        let body = self.body(serde_json::json!(texts), first);
        let result = self.call(body).await?;

        if result.data.len() != requests.len() {
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "API returned {} embeddings for {} texts",
                result.data.len(),
                requests.len()
            )));
        }

        // The API tags each item with its input position.
        let mut data = result.data;
        data.sort_by_key(|item| item.index);

        let dimension = data[0].embedding.len();
        for (position, item) in data.iter().enumerate() {
            if item.index != position {
                return Err(EmbeddingError::ProviderUnavailable(format!(
                    "batch item at position {position} has index {}",
                    item.index
                )));
            }
            if item.embedding.is_empty() || item.embedding.len() != dimension {
                return Err(EmbeddingError::ProviderUnavailable(format!(
                    "batch item {position} has {} components, expected {dimension}",
                    item.embedding.len()
                )));
            }
        }

        let model = result.model;
        let responses: Vec<EmbeddingResponse> = data
            .into_iter()
            .map(|item| EmbeddingResponse {
                embedding: item.embedding,
                model: model.clone(),
                dimension,
                tokens_used: None,
            })
            .collect();

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}
