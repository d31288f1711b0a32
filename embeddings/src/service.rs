//! Text-level similarity scoring on top of an [`EmbeddingProvider`].

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::provider::{EmbeddingMode, EmbeddingProvider, EmbeddingRequest};
use crate::similarity::cosine_similarity;

/// A candidate text with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// The candidate text.
    pub text: String,

    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

/// Compares texts by embedding them with the configured provider.
#[derive(Clone)]
pub struct SimilarityService {
    provider: Arc<dyn EmbeddingProvider>,
}

impl SimilarityService {
    /// Create a service over the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// The provider backing this service.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Similarity of two texts, both embedded as passages.
    pub async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f32> {
        let (a, b) = tokio::try_join!(
            self.provider.embed(EmbeddingRequest::new(text_a)),
            self.provider.embed(EmbeddingRequest::new(text_b)),
        )?;
        cosine_similarity(&a.embedding, &b.embedding)
    }

    /// Score every candidate against `query`, best match first.
    ///
    /// The query is embedded once (query mode where the provider supports it)
    /// and candidates are embedded in a single batch. Candidates with equal
    /// scores keep their input order.
    pub async fn rank(&self, query: &str, candidates: &[String]) -> Result<Vec<RankedCandidate>> {
        let mode = if self.provider.supports_query_mode() {
            EmbeddingMode::Query
        } else {
            EmbeddingMode::Passage
        };
        let query_request = EmbeddingRequest::new(query).with_mode(mode);
        query_request.validate()?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let candidate_requests: Vec<EmbeddingRequest> =
            candidates.iter().map(EmbeddingRequest::new).collect();
        let (query_response, candidate_responses) = tokio::try_join!(
            self.provider.embed(query_request),
            self.provider.embed_batch(candidate_requests),
        )?;

        let mut ranked = candidates
            .iter()
            .zip(&candidate_responses)
            .map(|(text, response)| {
                Ok(RankedCandidate {
                    text: text.clone(),
                    score: cosine_similarity(&query_response.embedding, &response.embedding)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // `sort_by_key` is stable, so ties keep their input order.
        ranked.sort_by_key(|c| std::cmp::Reverse(OrderedFloat(c.score)));

        debug!("Ranked {} candidates", ranked.len());
        Ok(ranked)
    }
}
