// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The production path talks to an OpenAI-compatible `/embeddings` endpoint.
//! A command provider shells out to a user tool, and a hashed n-gram
//! provider gives deterministic vectors without any network access.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::config::{EmbeddingConfig, EmbeddingProviderType};
use crate::errors::EmbeddingError;

/// Hard cap on texts per request to the embedding service.
pub const MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_HASHED_DIMENSION: usize = 256;
const HASHED_NGRAM: usize = 3;

/// Trait for embedding providers.
///
/// Providers are shared by concurrent searches, so embedding takes `&self`.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates embeddings for the given texts.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| EmbeddingError::UnexpectedResponse("no embedding returned".into()).into())
    }
}

/// Creates the provider selected by configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider() {
        EmbeddingProviderType::Openai => {
            Ok(Box::new(OpenAiCompatibleProvider::from_config(config)?))
        }
        EmbeddingProviderType::Command => Ok(Box::new(CommandProvider::new(
            config.command().to_string(),
            config.model().to_string(),
        ))),
        EmbeddingProviderType::Hashed => {
            Ok(Box::new(HashedNgramProvider::new(config.hashed_dimensions())))
        }
        #[cfg(feature = "builtin")]
        EmbeddingProviderType::Builtin => Ok(Box::new(FastEmbedProvider::new()?)),
        #[cfg(not(feature = "builtin"))]
        EmbeddingProviderType::Builtin => {
            bail!("the builtin provider requires menusearch to be built with --features builtin")
        }
    }
}

/// Provider for OpenAI-compatible embedding APIs (OpenAI, OpenRouter, ...).
pub struct OpenAiCompatibleProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            batch_size: MAX_BATCH_SIZE,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let key_var = config.api_key_env();
        let api_key = match env::var(key_var) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Err(EmbeddingError::MissingApiKey(key_var.to_string()).into()),
        };
        let mut provider = Self::new(
            config.base_url(),
            api_key,
            config.model(),
            Some(config.dimensions()),
            Duration::from_secs(config.timeout_secs()),
        )?;
        provider.batch_size = config.batch_size();
        Ok(provider)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl EmbeddingProvider for OpenAiCompatibleProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingsRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "menusearch")
            .json(&body)
            .send()
            .with_context(|| format!("Failed to reach embedding service at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            }
            .into());
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .context("Failed to parse embedding service response")?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.data.len(),
            }
            .into());
        }

        let mut rows = parsed.data;
        if rows.iter().all(|row| row.index.is_some()) {
            rows.sort_by_key(|row| row.index);
        }
        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }
}

/// Command provider that shells out to an external process.
///
/// The command receives `{"model": ..., "texts": [...]}` on stdin and must
/// print a JSON array of vectors (or an object holding one under
/// `embeddings`, `vectors` or `data`).
pub struct CommandProvider {
    command: String,
    model: String,
    batch_size: usize,
}

impl CommandProvider {
    pub fn new(command: String, model: String) -> Self {
        Self {
            command,
            model,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        });

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn embedding command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.to_string().as_bytes())
                .context("Failed to write embeddings payload to stdin")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to read embeddings command output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Embedding command failed (status {}): {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Value = serde_json::from_str(stdout.trim())
            .context("Failed to parse embeddings command output as JSON")?;
        parse_vectors(parsed)
    }
}

fn parse_vectors(parsed: Value) -> Result<Vec<Vec<f32>>> {
    let rows = match parsed {
        Value::Array(arr) => arr,
        Value::Object(mut obj) => match ["embeddings", "vectors", "data"]
            .iter()
            .find_map(|key| obj.remove(*key))
        {
            Some(Value::Array(arr)) => arr,
            _ => bail!("Embeddings command output missing 'embeddings' array"),
        },
        _ => bail!("Embeddings command output must be JSON array or object"),
    };

    rows.iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| anyhow::anyhow!("Embedding row must be an array"))?
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .ok_or_else(|| anyhow::anyhow!("Embedding value must be a number"))
                        .map(|v| v as f32)
                })
                .collect::<Result<Vec<f32>>>()
        })
        .collect()
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run_command(texts)
    }
}

/// Deterministic offline provider: hashes character trigrams of each word
/// into a fixed number of buckets.
///
/// Identical texts always get identical vectors and texts sharing many
/// trigrams land close together, which is enough for demos and tests.
pub struct HashedNgramProvider {
    model: String,
    dimension: usize,
}

impl HashedNgramProvider {
    pub fn new(dimension: usize) -> Self {
        let dimension = if dimension == 0 {
            DEFAULT_HASHED_DIMENSION
        } else {
            dimension
        };
        Self {
            model: format!("hashed-trigram-{dimension}"),
            dimension,
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.split_whitespace() {
            let padded: Vec<char> = format!("<{word}>").chars().collect();
            if padded.len() <= HASHED_NGRAM {
                vector[self.bucket(&padded.iter().collect::<String>())] += 1.0;
                continue;
            }
            for window in padded.windows(HASHED_NGRAM) {
                let gram: String = window.iter().collect();
                vector[self.bucket(&gram)] += 1.0;
            }
        }
        vector
    }

    fn bucket(&self, gram: &str) -> usize {
        let hash = blake3::hash(gram.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        (u64::from_le_bytes(bytes) % self.dimension as u64) as usize
    }
}

impl Default for HashedNgramProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHED_DIMENSION)
    }
}

impl EmbeddingProvider for HashedNgramProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Local multilingual model through fastembed.
#[cfg(feature = "builtin")]
pub struct FastEmbedProvider {
    embedder: std::sync::Mutex<fastembed::TextEmbedding>,
    model_id: String,
}

#[cfg(feature = "builtin")]
impl FastEmbedProvider {
    pub fn new() -> Result<Self> {
        let model = fastembed::EmbeddingModel::MultilingualE5Small;
        let model_id = model.to_string();
        let embedder = fastembed::TextEmbedding::try_new(fastembed::InitOptions::new(model))
            .context("Failed to initialize fastembed model")?;
        Ok(Self {
            embedder: std::sync::Mutex::new(embedder),
            model_id,
        })
    }
}

#[cfg(feature = "builtin")]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut embedder = self
            .embedder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(embedder.embed(texts, Some(MAX_BATCH_SIZE))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn hashed_provider_is_deterministic() {
        let provider = HashedNgramProvider::new(64);
        let a = provider.embed_one("برجر لحم").unwrap();
        let b = provider.embed_one("برجر لحم").unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn hashed_provider_places_shared_words_closer() {
        let provider = HashedNgramProvider::default();
        let query = provider.embed_one("برجر لحم").unwrap();
        let near = provider.embed_one("برجر لحم بالجبن").unwrap();
        let far = provider.embed_one("عصير برتقال").unwrap();
        assert!(cosine(&query, &near) > cosine(&query, &far));
    }

    #[test]
    fn hashed_provider_zero_dimension_uses_default() {
        let provider = HashedNgramProvider::new(0);
        assert_eq!(provider.embed_one("x").unwrap().len(), DEFAULT_HASHED_DIMENSION);
    }

    #[test]
    fn test_empty_embed() {
        let provider = HashedNgramProvider::default();
        assert!(provider.embed_texts(&[]).unwrap().is_empty());
    }

    #[test]
    fn parse_vectors_accepts_array_and_object() {
        let vectors = parse_vectors(serde_json::json!([[1.0, 2.0], [3.0, 4.0]])).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let vectors = parse_vectors(serde_json::json!({"embeddings": [[0.5]]})).unwrap();
        assert_eq!(vectors, vec![vec![0.5]]);

        assert!(parse_vectors(serde_json::json!({"other": []})).is_err());
        assert!(parse_vectors(serde_json::json!([["x"]])).is_err());
    }

    #[test]
    fn command_provider_round_trip() {
        let provider = CommandProvider::new(
            "cat > /dev/null; echo '[[1, 0], [0, 1]]'".to_string(),
            "test".to_string(),
        );
        let vectors = provider
            .embed_texts(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn command_provider_failure_propagates() {
        let provider = CommandProvider::new("exit 3".to_string(), "test".to_string());
        assert!(provider.embed_texts(&["a".to_string()]).is_err());
    }
}
