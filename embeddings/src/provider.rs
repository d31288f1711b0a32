//! Embedding provider contract.
//!
//! Every backend (a self-hosted model service, a hosted API) implements
//! [`EmbeddingProvider`]. Callers hold an `Arc<dyn EmbeddingProvider>` built
//! once at startup and never branch on the concrete variant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// How the embedded text will be used.
///
/// Retrieval-tuned models embed the text being searched (`Passage`) and the
/// text doing the searching (`Query`) differently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Text that will be searched against.
    #[default]
    Passage,
    /// Text used to search.
    Query,
}

impl EmbeddingMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingMode::Passage => "passage",
            EmbeddingMode::Query => "query",
        }
    }
}

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Passage or query semantics.
    #[serde(default)]
    pub mode: EmbeddingMode,

    /// Model to use (provider-specific).
    pub model: Option<String>,

    /// Dimensions for the output (if supported by provider).
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new passage-mode embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: EmbeddingMode::Passage,
            model: None,
            dimensions: None,
        }
    }

    /// Create a new query-mode embedding request.
    pub fn query(text: impl Into<String>) -> Self {
        Self::new(text).with_mode(EmbeddingMode::Query)
    }

    /// Set the embedding mode.
    pub fn with_mode(mut self, mode: EmbeddingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Reject blank text before any backend call is made.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        Ok(())
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Whether the backend produces distinct query-mode embeddings.
    ///
    /// Providers that return `false` accept query-mode requests and embed
    /// them with passage semantics.
    fn supports_query_mode(&self) -> bool {
        false
    }

    /// Generate an embedding for the given request.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Generate embeddings for multiple requests.
    ///
    /// The output has the same length and order as the input. An empty
    /// input yields an empty output without contacting the backend.
    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }

    /// Embed a single text with passage semantics.
    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed(EmbeddingRequest::new(text)).await?.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world")
            .with_model("text-embedding-3-small")
            .with_dimensions(512);

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.mode, EmbeddingMode::Passage);
        assert_eq!(request.model, Some("text-embedding-3-small".to_string()));
        assert_eq!(request.dimensions, Some(512));
    }

    #[test]
    fn test_query_request() {
        let request = EmbeddingRequest::query("rust jobs in Berlin");
        assert_eq!(request.mode, EmbeddingMode::Query);
        assert_eq!(request.mode.as_str(), "query");
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(matches!(
            EmbeddingRequest::new("").validate(),
            Err(EmbeddingError::EmptyInput)
        ));
        assert!(matches!(
            EmbeddingRequest::new(" \n\t ").validate(),
            Err(EmbeddingError::EmptyInput)
        ));
        assert!(EmbeddingRequest::new("x").validate().is_ok());
    }
}
