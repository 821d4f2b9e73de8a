// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for menusearch
//!
//! Loads configuration from .menusearchrc.toml in current directory or
//! ~/.config/menusearch/config.toml

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding `[catalog] path`.
pub const CATALOG_ENV: &str = "MENUSEARCH_CATALOG";
/// Environment variable overriding `[embeddings] provider`.
pub const PROVIDER_ENV: &str = "MENUSEARCH_PROVIDER";

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// OpenAI-compatible HTTP embeddings endpoint
    #[default]
    Openai,
    Command,
    /// Offline character n-gram hashing
    Hashed,
    Builtin,
}

impl EmbeddingProviderType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Self::Openai),
            "command" => Some(Self::Command),
            "hashed" => Some(Self::Hashed),
            "builtin" => Some(Self::Builtin),
            _ => None,
        }
    }
}

/// Catalog configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the menu JSON document
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Get catalog path (defaults to data/menu.json)
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from("data/menu.json"))
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (openai, command, hashed, builtin)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the embedding provider
    pub model: Option<String>,
    /// Requested vector dimension
    pub dimensions: Option<usize>,
    /// Base URL of the embeddings API
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Texts per request
    pub batch_size: Option<usize>,
    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Command to execute for command provider
    pub command: Option<String>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Openai)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "openai/text-embedding-3-large")
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or("openai/text-embedding-3-large")
    }

    /// Get vector dimension (defaults to 1024)
    pub fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(1024)
    }

    /// Dimension for the hashed provider, which has no model-imposed size
    pub fn hashed_dimensions(&self) -> usize {
        self.dimensions
            .unwrap_or(crate::embedding::provider::DEFAULT_HASHED_DIMENSION)
    }

    /// Get base URL (defaults to OpenRouter)
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://openrouter.ai/api/v1")
    }

    /// Get API key variable name (defaults to OPENROUTER_API_KEY)
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or("OPENROUTER_API_KEY")
    }

    /// Get batch size (defaults to 100, never above 100)
    pub fn batch_size(&self) -> usize {
        self.batch_size
            .unwrap_or(crate::embedding::MAX_BATCH_SIZE)
            .clamp(1, crate::embedding::MAX_BATCH_SIZE)
    }

    /// Get request timeout (defaults to 30s)
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }

    /// Get command (defaults to "embedder")
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or("embedder")
    }
}

/// Search configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of candidates per response
    pub top_k: Option<usize>,
    pub high_threshold: Option<f32>,
    pub medium_threshold: Option<f32>,
    pub low_name_threshold: Option<f32>,
    pub low_full_threshold: Option<f32>,
}

impl SearchConfig {
    /// Get top k (defaults to 5)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(crate::index::DEFAULT_TOP_K).max(1)
    }

    /// Get high-confidence cutoff (defaults to 0.75)
    pub fn high_threshold(&self) -> f32 {
        self.high_threshold.unwrap_or(0.75)
    }

    /// Get medium-confidence cutoff (defaults to 0.55)
    pub fn medium_threshold(&self) -> f32 {
        self.medium_threshold.unwrap_or(0.55)
    }

    /// Get name-hit cutoff for the low-confidence merge (defaults to 0.3)
    pub fn low_name_threshold(&self) -> f32 {
        self.low_name_threshold.unwrap_or(0.3)
    }

    /// Get full-index cutoff for the low-confidence merge (defaults to 0.35)
    pub fn low_full_threshold(&self) -> f32 {
        self.low_full_threshold.unwrap_or(0.35)
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled
    pub enabled: Option<bool>,
    /// Width of a cache time bucket in seconds
    pub bucket_secs: Option<u64>,
    /// Maximum entries kept per bucket
    pub capacity: Option<usize>,
}

impl CacheConfig {
    /// Get enabled (defaults to true)
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Get bucket width (defaults to 300 seconds)
    pub fn bucket_secs(&self) -> u64 {
        self.bucket_secs.unwrap_or(300).max(1)
    }

    /// Get capacity (defaults to 128)
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(128).max(1)
    }
}

/// Configuration loaded from .menusearchrc.toml or ~/.config/menusearch/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: Option<String>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .menusearchrc.toml in current directory
    /// 2. ~/.config/menusearch/config.toml
    ///
    /// Environment overrides are applied on top.
    pub fn load() -> Self {
        let mut config = Self::discover().unwrap_or_default();
        config.apply_env();
        config
    }

    /// Like [`load`](Self::load), but an explicit path must exist and parse.
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = explicit else {
            return Ok(Self::load());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn discover() -> Option<Self> {
        // Try current directory first
        if let Some(config) = Self::load_from_path(Path::new(".menusearchrc.toml")) {
            return Some(config);
        }

        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("menusearch").join("config.toml");
        Self::load_from_path(&config_path)
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::from_toml_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(CATALOG_ENV) {
            if !path.trim().is_empty() {
                self.catalog.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(value) = std::env::var(PROVIDER_ENV) {
            match EmbeddingProviderType::parse(&value) {
                Some(provider) => self.embeddings.provider = Some(provider),
                None => warn!("Ignoring unknown {}={}", PROVIDER_ENV, value),
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format
            .as_ref()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(ConfigOutputFormat::Json),
                "text" => Some(ConfigOutputFormat::Text),
                _ => None,
            })
    }

    /// Merge CLI top-k with config (CLI wins)
    pub fn merge_top_k(&self, cli_value: Option<usize>) -> usize {
        cli_value.unwrap_or_else(|| self.search.top_k()).max(1)
    }

    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }
}
