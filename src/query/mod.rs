// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - search, lookup and catalog commands

pub mod check;
pub mod item;
pub mod normalize;
pub mod repl;
pub mod search;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::OutputFormat;
use menusearch::cache::{CachedSearcher, ResultCache, SystemClock};
use menusearch::catalog::Catalog;
use menusearch::config::{Config, ConfigOutputFormat};
use menusearch::embedding::{create_provider, EmbeddingClient};
use menusearch::engine::{SearchEngine, Thresholds};
use menusearch::output::{
    colorize_confidence, colorize_detail, colorize_id, colorize_name, colorize_score,
    format_price, print_json, use_colors,
};
use menusearch::response::SearchResponse;

/// Settings every command receives from `main`.
pub struct Session {
    pub config: Config,
    pub format: OutputFormat,
    pub compact: bool,
    pub quiet: bool,
}

impl Session {
    pub fn new(config: Config, format: Option<OutputFormat>, compact: bool, quiet: bool) -> Self {
        let format = format.unwrap_or(match config.output_format() {
            Some(ConfigOutputFormat::Json) => OutputFormat::Json,
            _ => OutputFormat::Text,
        });
        Self {
            config,
            format,
            compact,
            quiet,
        }
    }

    pub fn catalog_path(&self, cli_value: Option<&Path>) -> PathBuf {
        cli_value
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.catalog().path())
    }

    pub fn load_catalog(&self, cli_value: Option<&Path>) -> Result<Catalog> {
        Catalog::load(self.catalog_path(cli_value))
    }

    /// Loads the catalog and embeds it into both indexes.
    pub fn build_engine(&self, cli_value: Option<&Path>) -> Result<SearchEngine> {
        let catalog = self.load_catalog(cli_value)?;
        let provider = create_provider(self.config.embeddings())
            .context("Failed to create embedding provider")?;
        let client = EmbeddingClient::new(provider);

        let pb = if self.quiet || self.format == OutputFormat::Json {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new((catalog.len() * 2) as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {pos}/{len} texts | Embedding {msg}")?
                    .progress_chars("##."),
            );
            pb.set_message(client.model_id().to_string());
            pb
        };

        let engine = SearchEngine::build(
            catalog,
            client,
            Thresholds::from(self.config.search()),
            Some(&pb),
        )?;
        pb.finish_and_clear();
        Ok(engine)
    }

    /// Wraps the engine in the configured cache, or none when disabled.
    pub fn searcher(&self, engine: SearchEngine, top_k: usize, no_cache: bool) -> CachedSearcher {
        let engine = Arc::new(engine);
        let cache = self.config.cache();
        if no_cache || !cache.enabled() {
            return CachedSearcher::uncached(engine, top_k);
        }
        let cache = ResultCache::new(Arc::new(SystemClock), cache.bucket_secs(), cache.capacity());
        CachedSearcher::new(engine, cache, top_k)
    }

    pub fn print_response(&self, response: &SearchResponse) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(response, self.compact),
            OutputFormat::Text => {
                print_response_text(response, use_colors());
                Ok(())
            }
        }
    }
}

fn print_response_text(response: &SearchResponse, use_color: bool) {
    match response {
        SearchResponse::Found(found) => {
            println!(
                "{} {} · {} ({} item{})",
                if use_color { "✓".green().to_string() } else { "✓".to_string() },
                colorize_confidence(found.confidence.as_str(), use_color),
                found.action.as_str(),
                found.items.len(),
                if found.items.len() == 1 { "" } else { "s" }
            );
            for item in &found.items {
                let secondary = if item.name_secondary.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", item.name_secondary)
                };
                println!(
                    "  {} {}{}  {}  {}  {}",
                    colorize_score(item.score, use_color),
                    colorize_name(&item.name_primary, use_color),
                    secondary,
                    format_price(&item.price),
                    colorize_detail(&item.category, use_color),
                    colorize_id(&item.item_id, use_color),
                );
            }
            println!("{}", colorize_detail(&found.instruction, use_color));
        }
        SearchResponse::NotFound(missing) => {
            println!(
                "{} No match for: {}",
                if use_color { "✗".red().to_string() } else { "✗".to_string() },
                missing.query
            );
            if !missing.suggested_categories.is_empty() {
                println!(
                    "  Categories: {}",
                    colorize_detail(&missing.suggested_categories.join(", "), use_color)
                );
            }
        }
    }
}
