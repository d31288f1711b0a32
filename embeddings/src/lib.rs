//! # Embeddings
//!
//! Turns text into fixed-dimension vectors and compares them.
//!
//! ## Features
//!
//! - **Vector math**: cosine similarity with explicit failure on mismatched
//!   or zero vectors
//! - **Multiple providers**: a self-hosted model service or the OpenAI API,
//!   chosen once at startup from configuration
//! - **Similarity scoring**: pairwise similarity and ranking of candidates
//! - **Caching**: optional in-memory cache in front of any provider
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingConfig ──► build_provider ──► SimilarityService       │
//! │                           │                     │               │
//! │                           ▼                     ▼               │
//! │          LocalModel / OpenAI (+ cache)   cosine_similarity      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod local;
pub mod openai;
pub mod provider;
pub mod service;
pub mod similarity;

pub use cache::{CachedProvider, EmbeddingCache};
pub use config::{EmbeddingConfig, EmbeddingProviderType, build_provider, build_provider_with_key};
pub use error::{EmbeddingError, Result};
pub use local::LocalModelProvider;
pub use openai::OpenAIProvider;
pub use provider::{EmbeddingMode, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use service::{RankedCandidate, SimilarityService};
pub use similarity::cosine_similarity;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
