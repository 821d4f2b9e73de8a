// SPDX-License-Identifier: MIT OR Apache-2.0

//! menusearch - Semantic menu lookup
//!
//! Resolves noisy food names against a menu catalog using two embedding
//! indexes, confidence routing and a keyword fallback.

mod cli;
mod query;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use menusearch::config::Config;
use query::Session;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with MENUSEARCH_LOG env var (e.g., MENUSEARCH_LOG=debug menusearch search "برقر")
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MENUSEARCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "menusearch", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_with(cli.config.as_deref())?;
    let session = Session::new(config, cli.format, cli.compact, cli.quiet);

    match cli.command {
        Commands::Search {
            query,
            top_k,
            catalog,
            no_cache,
        } => {
            query::search::run(&session, &query, top_k, catalog.as_deref(), no_cache)?;
        }
        Commands::Item { id, catalog } => {
            if !query::item::run(&session, &id, catalog.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Normalize { text } => {
            query::normalize::run(&session, &text)?;
        }
        Commands::Check { catalog } => {
            query::check::run(&session, catalog.as_deref())?;
        }
        Commands::Repl { top_k, catalog } => {
            query::repl::run(&session, top_k, catalog.as_deref())?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
