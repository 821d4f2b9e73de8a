// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// menusearch - Semantic menu lookup
///
/// Resolves free-text (mostly Arabic) food names to catalog items with a
/// confidence tier and a suggested action.
#[derive(Parser, Debug)]
#[command(name = "menusearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .menusearchrc.toml or ~/.config/menusearch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a query against the menu
    #[command(visible_alias = "s")]
    Search {
        /// Free-text item name, e.g. "برقر لحم"
        query: String,

        /// Maximum number of candidates
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Catalog path (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show full details for one item id
    Item {
        /// Item identifier, e.g. main_016
        id: String,

        /// Catalog path (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Print the canonical form of a text
    Normalize {
        /// Text to normalize
        text: String,
    },

    /// Validate a catalog without embedding it
    Check {
        /// Catalog path (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Answer queries read line by line from stdin
    Repl {
        /// Maximum number of candidates
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Catalog path (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
