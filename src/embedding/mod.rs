// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns normalized text into dense vectors
//!
//! Providers talk to a concrete backend; the client batches requests and
//! hands back unit-length vectors ready for inner-product search.

pub mod client;
pub mod provider;

pub use client::{l2_normalize, EmbeddingClient};
#[cfg(feature = "builtin")]
pub use provider::FastEmbedProvider;
pub use provider::{
    create_provider, CommandProvider, EmbeddingProvider, HashedNgramProvider,
    OpenAiCompatibleProvider, MAX_BATCH_SIZE,
};
