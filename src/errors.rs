// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types callers may want to match on.
//!
//! Most library functions return `anyhow::Result`; these enums are the
//! concrete errors wrapped inside it.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading a catalog. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to parse catalog {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate item id '{0}' in catalog")]
    DuplicateId(String),
    #[error("catalog item #{0} has an empty id")]
    EmptyId(usize),
    #[error("catalog item '{0}' has an empty primary name")]
    EmptyName(String),
}

/// Failures reported by, or about, the embedding service.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected embedding response: {0}")]
    UnexpectedResponse(String),
    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// Failures while querying a vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failures while resolving an item price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("item has no size options; size '{0}' is not available")]
    SizeNotOffered(String),
    #[error("item has an empty size table")]
    EmptySizes,
}
