// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence routing over the name index, the full index and the keyword
//! matcher.
//!
//! A query walks a staged funnel and stops at the first stage that produces
//! candidates:
//!
//! 1. name index, best score `>= high` → single item, add directly
//! 2. name index, best score `>= medium` → every name hit `>= medium`
//! 3. name top 3 `>= low_name` merged with full-index hits `>= low_full`
//! 4. keyword fallback
//! 5. not found, with the catalog's categories as guidance
//!
//! The engine is immutable once built and can be shared between threads.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogItem};
use crate::config::SearchConfig;
use crate::embedding::EmbeddingClient;
use crate::index::VectorIndex;
use crate::keyword::KeywordMatcher;
use crate::normalize::normalize;
use crate::response::{
    Action, Confidence, Found, MatchSource, NotFound, SearchResponse, SearchResult,
};

/// Name hits considered when merging low-confidence results.
const LOW_NAME_CANDIDATES: usize = 3;

/// Score cutoffs for each stage of the funnel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub high: f32,
    pub medium: f32,
    /// Name hits kept in the low-confidence merge.
    pub low_name: f32,
    /// Full-index hits kept in the low-confidence merge.
    pub low_full: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 0.75,
            medium: 0.55,
            low_name: 0.3,
            low_full: 0.35,
        }
    }
}

impl From<&SearchConfig> for Thresholds {
    fn from(config: &SearchConfig) -> Self {
        Self {
            high: config.high_threshold(),
            medium: config.medium_threshold(),
            low_name: config.low_name_threshold(),
            low_full: config.low_full_threshold(),
        }
    }
}

pub struct SearchEngine {
    catalog: Catalog,
    client: EmbeddingClient,
    name_index: VectorIndex,
    full_index: VectorIndex,
    keyword: KeywordMatcher,
    thresholds: Thresholds,
}

impl SearchEngine {
    /// Builds both indexes with default thresholds.
    pub fn new(catalog: Catalog, client: EmbeddingClient) -> Result<Self> {
        Self::build(catalog, client, Thresholds::default(), None)
    }

    /// Embeds the catalog twice (names, then full text) and assembles the
    /// engine. Blocks until every batch has been embedded.
    pub fn build(
        catalog: Catalog,
        client: EmbeddingClient,
        thresholds: Thresholds,
        progress: Option<&ProgressBar>,
    ) -> Result<Self> {
        let name_index = VectorIndex::build(
            "name",
            &catalog,
            &client,
            CatalogItem::name_text,
            progress,
        )
        .context("Failed to build name index")?;
        let full_index = VectorIndex::build(
            "full",
            &catalog,
            &client,
            CatalogItem::full_text,
            progress,
        )
        .context("Failed to build full index")?;
        let keyword = KeywordMatcher::new(&catalog);

        info!(
            items = catalog.len(),
            model = client.model_id(),
            "search engine ready"
        );

        Ok(Self {
            catalog,
            client,
            name_index,
            full_index,
            keyword,
            thresholds,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn model_id(&self) -> &str {
        self.client.model_id()
    }

    /// Direct lookup by item id.
    pub fn get_item_by_id(&self, id: &str) -> Option<&CatalogItem> {
        self.catalog.get_by_id(id)
    }

    /// Resolves a free-text query. Embedding failures propagate; a query
    /// that normalizes to nothing is answered with `NotFound`.
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchResponse> {
        let top_k = top_k.max(1);
        let normalized = normalize(query);
        if normalized.is_empty() {
            debug!(query, "empty query after normalization");
            return Ok(self.not_found(query));
        }

        let embedding = self
            .client
            .embed(&normalized)
            .with_context(|| format!("Failed to embed query '{}'", query))?;

        let name_hits = self
            .name_index
            .search(&embedding, top_k.max(LOW_NAME_CANDIDATES))?;
        let best = name_hits.first().map(|hit| hit.0).unwrap_or(0.0);
        debug!(query, normalized = %normalized, best, "name index searched");

        if let Some(&(score, position)) = name_hits.first() {
            if score >= self.thresholds.high {
                return Ok(self.found(
                    Confidence::High,
                    Action::AddDirectly,
                    MatchSource::Names,
                    self.results(&[(score, position)]),
                    query,
                ));
            }

            if score >= self.thresholds.medium {
                let hits: Vec<(f32, usize)> = name_hits
                    .iter()
                    .copied()
                    .filter(|hit| hit.0 >= self.thresholds.medium)
                    .take(top_k)
                    .collect();
                return Ok(self.found(
                    Confidence::Medium,
                    Action::ShowOptions,
                    MatchSource::Names,
                    self.results(&hits),
                    query,
                ));
            }
        }

        let full_hits = self.full_index.search(&embedding, top_k)?;
        let merged = self.merge_low(&name_hits, &full_hits, top_k);
        debug!(
            full_best = full_hits.first().map(|hit| hit.0).unwrap_or(0.0),
            merged = merged.len(),
            "low-confidence merge"
        );
        if !merged.is_empty() {
            return Ok(self.found(
                Confidence::Low,
                Action::ShowOptions,
                MatchSource::Descriptions,
                self.results(&merged),
                query,
            ));
        }

        let keyword_hits = self.keyword.search(&normalized, top_k);
        debug!(hits = keyword_hits.len(), "keyword fallback");
        if !keyword_hits.is_empty() {
            return Ok(self.found(
                Confidence::Low,
                Action::ShowOptions,
                MatchSource::Keywords,
                self.results(&keyword_hits),
                query,
            ));
        }

        Ok(self.not_found(query))
    }

    /// Name hits first, then full-index hits; the first score seen for an
    /// item is kept.
    fn merge_low(
        &self,
        name_hits: &[(f32, usize)],
        full_hits: &[(f32, usize)],
        top_k: usize,
    ) -> Vec<(f32, usize)> {
        let names = name_hits
            .iter()
            .take(LOW_NAME_CANDIDATES)
            .filter(|hit| hit.0 >= self.thresholds.low_name);
        let full = full_hits
            .iter()
            .filter(|hit| hit.0 >= self.thresholds.low_full);

        let mut seen = HashSet::new();
        let mut merged: Vec<(f32, usize)> = names
            .chain(full)
            .copied()
            .filter(|hit| seen.insert(hit.1))
            .collect();
        merged.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        merged.truncate(top_k);
        merged
    }

    fn results(&self, hits: &[(f32, usize)]) -> Vec<SearchResult> {
        hits.iter()
            .filter_map(|&(score, position)| {
                self.catalog
                    .get(position)
                    .map(|item| SearchResult::from_item(item, score))
            })
            .collect()
    }

    fn found(
        &self,
        confidence: Confidence,
        action: Action,
        source: MatchSource,
        items: Vec<SearchResult>,
        query: &str,
    ) -> SearchResponse {
        debug!(
            confidence = confidence.as_str(),
            action = action.as_str(),
            count = items.len(),
            "query resolved"
        );
        let mut found = Found {
            confidence,
            action,
            source,
            items,
            instruction: String::new(),
        };
        found.instruction = found.compose_instruction(query);
        SearchResponse::Found(found)
    }

    fn not_found(&self, query: &str) -> SearchResponse {
        SearchResponse::NotFound(NotFound {
            query: query.to_string(),
            suggested_categories: self.catalog.categories(),
        })
    }
}
