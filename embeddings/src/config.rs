//! Provider configuration and startup wiring.
//!
//! Exactly one provider is active per deployment. [`build_provider`] turns an
//! [`EmbeddingConfig`] into the `Arc<dyn EmbeddingProvider>` handed to every
//! caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{CachedProvider, EmbeddingCache};
use crate::error::{EmbeddingError, Result};
use crate::local::{DEFAULT_LOCAL_MODEL, DEFAULT_LOCAL_URL, LocalModelProvider};
use crate::openai::{DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, OpenAIProvider};
use crate::provider::EmbeddingProvider;

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderType,

    /// Settings for the self-hosted model service.
    pub local_model: LocalModelConfig,

    /// Settings for the OpenAI API.
    pub openai: OpenAIConfig,

    /// Whether to cache embeddings in memory.
    pub cache_enabled: bool,

    /// Maximum cache size.
    pub cache_max_entries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderType::LocalModel,
            local_model: LocalModelConfig::default(),
            openai: OpenAIConfig::default(),
            cache_enabled: false,
            cache_max_entries: 10000,
        }
    }
}

impl EmbeddingConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Self-hosted model service.
    LocalModel,
    /// OpenAI embeddings API.
    #[serde(rename = "openai")]
    OpenAI,
}

/// Settings for [`LocalModelProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Service base URL.
    pub base_url: String,

    /// Label for the served model.
    pub model: String,

    /// Request timeout (in seconds).
    pub timeout_secs: u64,

    /// Use `/embed/batch` for batches instead of sequential calls. Batch
    /// texts are sent with their mode prefix already applied.
    pub use_batch_endpoint: bool,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_URL.to_string(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            timeout_secs: 30,
            use_batch_endpoint: true,
        }
    }
}

/// Settings for [`OpenAIProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// API base URL.
    pub base_url: String,

    /// Embedding model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Requested output dimensions, if the model supports shortening.
    pub dimensions: Option<usize>,

    /// Request timeout (in seconds).
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dimensions: None,
            timeout_secs: 30,
        }
    }
}

/// Build the configured provider.
///
/// The OpenAI key is read from the environment variable named in the config;
/// a missing key fails here rather than on first use.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let api_key = std::env::var(&config.openai.api_key_env).ok();
    build_provider_with_key(config, api_key)
}

/// Build the configured provider with an explicitly supplied OpenAI key.
pub fn build_provider_with_key(
    config: &EmbeddingConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderType::LocalModel => {
            let local = &config.local_model;
            let provider = LocalModelProvider::new(&local.base_url)
                .with_model(&local.model)
                .with_batch_endpoint(local.use_batch_endpoint)
                .with_timeout(Duration::from_secs(local.timeout_secs))?;
            info!("Using local model embeddings at {}", local.base_url);
            Ok(wrap(provider, config))
        }
        EmbeddingProviderType::OpenAI => {
            let openai = &config.openai;
            let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                EmbeddingError::Config(format!("{} is not set", openai.api_key_env))
            })?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_base_url(&openai.base_url)
                .with_model(&openai.model)
                .with_timeout(Duration::from_secs(openai.timeout_secs))?;
            if let Some(dims) = openai.dimensions {
                provider = provider.with_dimensions(dims);
            }
            info!("Using OpenAI embeddings with model {}", openai.model);
            Ok(wrap(provider, config))
        }
    }
}

fn wrap<P>(provider: P, config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider>
where
    P: EmbeddingProvider + 'static,
{
    if config.cache_enabled {
        Arc::new(CachedProvider::new(
            provider,
            EmbeddingCache::new(config.cache_max_entries),
        ))
    } else {
        Arc::new(provider)
    }
}
