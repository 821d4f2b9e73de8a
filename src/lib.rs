// SPDX-License-Identifier: MIT OR Apache-2.0

//! menusearch - Semantic menu lookup library
//!
//! Build a [`engine::SearchEngine`] once from a [`catalog::Catalog`] and an
//! [`embedding::EmbeddingClient`], then share it (optionally behind a
//! [`cache::CachedSearcher`]) with whatever layer issues searches.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod index;
pub mod keyword;
pub mod normalize;
pub mod output;
pub mod response;
