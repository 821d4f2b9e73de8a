// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact (flat) inner-product index over unit vectors.
//!
//! Entry `i` of an index always corresponds to catalog position `i`. Both the
//! name index and the full index are built by [`VectorIndex::build`], which
//! only differs in the text extracted from each item.

use anyhow::Result;
use indicatif::ProgressBar;
use std::cmp::Ordering;
use tracing::info;

use crate::catalog::{Catalog, CatalogItem};
use crate::embedding::{l2_normalize, EmbeddingClient};
use crate::errors::IndexError;
use crate::normalize::normalize;

/// Default number of neighbours returned by a query.
pub const DEFAULT_TOP_K: usize = 5;

/// Read-only flat index. Safe to share between threads once built.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    label: String,
    dimension: usize,
    /// Row-major, one unit vector per catalog position.
    data: Vec<f32>,
}

impl VectorIndex {
    /// Embeds `extract(item)` for every catalog item, after normalization,
    /// and indexes the resulting vectors in catalog order.
    pub fn build<F>(
        label: &str,
        catalog: &Catalog,
        client: &EmbeddingClient,
        extract: F,
        progress: Option<&ProgressBar>,
    ) -> Result<Self>
    where
        F: Fn(&CatalogItem) -> String,
    {
        let texts: Vec<String> = catalog
            .items()
            .iter()
            .map(|item| normalize(&extract(item)))
            .collect();
        let vectors = client.embed_batch_with_progress(&texts, progress)?;
        let index = Self::from_vectors(label, vectors)?;
        info!(
            index = label,
            entries = index.len(),
            dimension = index.dimension(),
            "built vector index"
        );
        Ok(index)
    }

    /// Builds an index from precomputed vectors, normalizing each one.
    pub fn from_vectors(label: &str, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(dimension * vectors.len());
        for mut vector in vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            l2_normalize(&mut vector);
            data.extend_from_slice(&vector);
        }
        Ok(Self {
            label: label.to_string(),
            dimension,
            data,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns up to `top_k` `(score, position)` pairs, best first.
    ///
    /// Scores are cosine similarities. Equal scores keep catalog order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(f32, usize)>, IndexError> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut unit = query.to_vec();
        l2_normalize(&mut unit);

        let mut hits: Vec<(f32, usize)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| row.iter().zip(&unit).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .map(|(position, score)| (score, position))
            .collect();

        // `sort_by` is stable, which gives the catalog-order tie-break.
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }
}
