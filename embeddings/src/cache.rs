//! Embedding cache for avoiding redundant provider calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingMode, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: String,
    mode: EmbeddingMode,
    dimensions: Option<usize>,
    text: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Embedding,
    inserted: u64,
}

/// Bounded in-memory embedding cache.
///
/// When full, the oldest entry is evicted.
pub struct EmbeddingCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    clock: AtomicU64,
}

impl EmbeddingCache {
    /// Create a new cache holding at most `max_entries` vectors.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn key(request: &EmbeddingRequest, model: &str) -> CacheKey {
        CacheKey {
            model: model.to_string(),
            mode: request.mode,
            dimensions: request.dimensions,
            text: request.text.clone(),
        }
    }

    /// Get the cached embedding for `request` as served by `model`.
    pub async fn get(&self, request: &EmbeddingRequest, model: &str) -> Option<Embedding> {
        let key = Self::key(request, model);
        self.entries
            .read()
            .await
            .get(&key)
            .map(|e| e.embedding.clone())
    }

    /// Cache the embedding `model` produced for `request`.
    pub async fn put(&self, request: &EmbeddingRequest, model: &str, embedding: Embedding) {
        let key = Self::key(request, model);
        let inserted = self.clock.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, v)| v.inserted)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, CacheEntry { embedding, inserted });
    }

    /// Number of cached vectors.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// A provider wrapper that serves repeated texts from an [`EmbeddingCache`].
pub struct CachedProvider<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    /// Create a new cached provider.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    fn model_for<'a>(&'a self, request: &'a EmbeddingRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    fn cached_response(
        &self,
        request: &EmbeddingRequest,
        embedding: Embedding,
    ) -> EmbeddingResponse {
        EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model_for(request).to_string(),
            tokens_used: None,
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn default_model(&self) -> &str {
        self.provider.default_model()
    }

    fn default_dimension(&self) -> usize {
        self.provider.default_dimension()
    }

    fn supports_query_mode(&self) -> bool {
        self.provider.supports_query_mode()
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        request.validate()?;
        let model = self.model_for(&request).to_string();

        if let Some(embedding) = self.cache.get(&request, &model).await {
            debug!("Cache hit for embedding");
            return Ok(self.cached_response(&request, embedding));
        }

        let response = self.provider.embed(request.clone()).await?;
        self.cache
            .put(&request, &model, response.embedding.clone())
            .await;
        Ok(response)
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        for request in &requests {
            request.validate()?;
        }

        let mut results: Vec<Option<EmbeddingResponse>> = Vec::with_capacity(requests.len());
        let mut misses = Vec::new();
        let mut miss_positions = Vec::new();

        for (position, request) in requests.iter().enumerate() {
            let model = self.model_for(request);
            match self.cache.get(request, model).await {
                Some(embedding) => results.push(Some(self.cached_response(request, embedding))),
                None => {
                    results.push(None);
                    misses.push(request.clone());
                    miss_positions.push(position);
                }
            }
        }

        debug!(
            "Batch cache: {} hits, {} misses",
            requests.len() - misses.len(),
            misses.len()
        );

        if !misses.is_empty() {
            let fetched = self.provider.embed_batch(misses).await?;
            for (position, response) in miss_positions.into_iter().zip(fetched) {
                let request = &requests[position];
                let model = self.model_for(request).to_string();
                self.cache
                    .put(request, &model, response.embedding.clone())
                    .await;
                results[position] = Some(response);
            }
        }

        results
            .into_iter()
            .map(|r| {
                r.ok_or_else(|| {
                    crate::EmbeddingError::ProviderUnavailable(
                        "batch returned fewer embeddings than requested".to_string(),
                    )
                })
            })
            .collect()
    }
}
