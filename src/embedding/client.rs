// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batching front-end over an [`EmbeddingProvider`].
//!
//! Chunks requests to the service limit, checks that every vector has the
//! same dimension and L2-normalizes the results so inner products are
//! cosine similarities. Provider failures are passed straight through; there
//! is no retry.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::debug;

use super::provider::{EmbeddingProvider, MAX_BATCH_SIZE};
use crate::errors::EmbeddingError;

pub struct EmbeddingClient {
    provider: Box<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingClient {
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        let batch_size = provider.batch_size().clamp(1, MAX_BATCH_SIZE);
        Self {
            provider,
            batch_size,
        }
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embeds one text.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = self.provider.embed_one(text)?;
        if vector.is_empty() {
            return Err(EmbeddingError::UnexpectedResponse("empty embedding vector".into()).into());
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    /// Embeds many texts, one service call per chunk of `batch_size`.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch_with_progress(texts, None)
    }

    /// Like [`embed_batch`](Self::embed_batch), ticking `progress` once per text.
    pub fn embed_batch_with_progress(
        &self,
        texts: &[String],
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut out: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        let mut dimension: Option<usize> = None;

        for (batch_no, chunk) in texts.chunks(self.batch_size).enumerate() {
            debug!(batch = batch_no, size = chunk.len(), "embedding batch");
            let vectors = self
                .provider
                .embed_texts(chunk)
                .with_context(|| format!("Embedding batch {} failed", batch_no))?;
            if vectors.len() != chunk.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: chunk.len(),
                    actual: vectors.len(),
                }
                .into());
            }

            for mut vector in vectors {
                let expected = *dimension.get_or_insert(vector.len());
                if vector.is_empty() || vector.len() != expected {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    }
                    .into());
                }
                l2_normalize(&mut vector);
                out.push(vector);
            }

            if let Some(bar) = progress {
                bar.inc(chunk.len() as u64);
            }
        }

        Ok(out)
    }
}

/// Scales a vector to unit length. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}
