//! Provider backed by a self-hosted embedding service.
//!
//! The service exposes two JSON endpoints:
//!
//! - `POST /embed` with `{text, type}` returning `{embedding, dimension}`
//! - `POST /embed/batch` with `{texts}` returning
//!   `{embeddings, count, dimension}`
//!
//! The single endpoint prefixes the text with its mode (`query: ` or
//! `passage: `) for the e5 model family. The batch endpoint encodes texts
//! verbatim, so this client applies the same prefix before sending a batch.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingMode, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Default address of the local embedding service.
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:8000";

/// Model served by the local embedding service.
pub const DEFAULT_LOCAL_MODEL: &str = "multilingual-e5-base";

const DEFAULT_LOCAL_DIMENSION: usize = 768;

/// Embedding provider that talks to a local model service over HTTP.
pub struct LocalModelProvider {
    /// Service base URL, without trailing slash.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Label reported for the served model.
    model: String,

    /// Use `/embed/batch` instead of one `/embed` call per text.
    use_batch_endpoint: bool,
}

impl LocalModelProvider {
    /// Create a provider pointing at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            use_batch_endpoint: true,
        }
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(format!("cannot build http client: {e}")))?;
        Ok(self)
    }

    /// Set the model label.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Choose between the batch endpoint and sequential single calls.
    pub fn with_batch_endpoint(mut self, enabled: bool) -> Self {
        self.use_batch_endpoint = enabled;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "local model service returned {status}: {error_text}"
            )));
        }

        response.json::<R>().await.map_err(|e| {
            EmbeddingError::ProviderUnavailable(format!("malformed response from {path}: {e}"))
        })
    }

    async fn embed_via_batch_endpoint(
        &self,
        requests: Vec<EmbeddingRequest>,
    ) -> Result<Vec<EmbeddingResponse>> {
        let expected = requests.len();
        debug!("Requesting {expected} local embeddings in one batch");

        let body = BatchEmbedBody {
            texts: requests
                .iter()
                .map(|r| prefixed(&r.text, r.mode))
                .collect(),
        };
        let result: BatchEmbedReply = self.post("/embed/batch", &body).await?;

        if result.count != expected || result.embeddings.len() != expected {
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "batch returned {} embeddings (count {}) for {expected} texts",
                result.embeddings.len(),
                result.count
            )));
        }

        let responses = result
            .embeddings
            .into_iter()
            .map(|embedding| self.to_response(embedding, result.dimension))
            .collect::<Result<Vec<_>>>()?;

        info!("Generated {} local batch embeddings", responses.len());
        Ok(responses)
    }

    fn to_response(&self, embedding: Vec<f64>, dimension: usize) -> Result<EmbeddingResponse> {
        if embedding.is_empty() || embedding.len() != dimension {
            return Err(EmbeddingError::ProviderUnavailable(format!(
                "embedding has {} components but service reported dimension {dimension}",
                embedding.len()
            )));
        }
        Ok(EmbeddingResponse {
            embedding: embedding.into_iter().map(|x| x as f32).collect(),
            model: self.model.clone(),
            dimension,
            tokens_used: None,
        })
    }
}

impl Default for LocalModelProvider {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_URL)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalModelProvider {
    fn name(&self) -> &str {
        "local_model"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn default_dimension(&self) -> usize {
        DEFAULT_LOCAL_DIMENSION
    }

    fn supports_query_mode(&self) -> bool {
        true
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        request.validate()?;

        debug!("Generating local {} embedding", request.mode.as_str());

        let body = EmbedBody {
            text: &request.text,
            mode: request.mode.as_str(),
        };
        let result: EmbedReply = self.post("/embed", &body).await?;
        self.to_response(result.embedding, result.dimension)
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        for request in &requests {
            request.validate()?;
        }

        if self.use_batch_endpoint {
            return self.embed_via_batch_endpoint(requests).await;
        }

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    text: &'a str,
    #[serde(rename = "type")]
    mode: &'static str,
}

#[derive(Deserialize)]
struct EmbedReply {
    embedding: Vec<f64>,
    dimension: usize,
}

/// Text as the single endpoint feeds it to the model.
fn prefixed(text: &str, mode: EmbeddingMode) -> String {
    format!("{}: {text}", mode.as_str())
}

#[derive(Serialize)]
struct BatchEmbedBody {
    texts: Vec<String>,
}

#[derive(Deserialize)]
struct BatchEmbedReply {
    embeddings: Vec<Vec<f64>>,
    count: usize,
    dimension: usize,
}
