// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented query loop over one engine build
//!
//! Each non-empty stdin line is a query. `:stats` prints cache counters and
//! `:quit` ends the loop.

use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use super::Session;
use crate::cli::OutputFormat;
use menusearch::output::print_json;

/// Run the repl command
pub fn run(session: &Session, top_k: Option<usize>, catalog: Option<&Path>) -> Result<()> {
    let top_k = session.config.merge_top_k(top_k);
    let engine = session.build_engine(catalog)?;
    let items = engine.catalog().len();
    let searcher = session.searcher(engine, top_k, false);

    let interactive = io::stdin().is_terminal() && session.format == OutputFormat::Text;
    if interactive {
        eprintln!("{} items loaded. Type a query, :stats or :quit.", items);
    }

    let stdin = io::stdin();
    let mut failures = 0usize;
    loop {
        if interactive {
            eprint!("{} ", ">".cyan());
            io::stderr().flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        match query {
            "" => continue,
            ":quit" | ":q" => break,
            ":stats" => {
                match searcher.stats() {
                    Some(stats) if session.format == OutputFormat::Json => {
                        print_json(&stats, session.compact)?
                    }
                    Some(stats) => println!(
                        "hits {} / misses {} / entries {} (bucket {})",
                        stats.hits, stats.misses, stats.entries, stats.bucket
                    ),
                    None => println!("cache disabled"),
                }
                continue;
            }
            _ => {}
        }

        match searcher.search(query) {
            Ok(response) => session.print_response(&response)?,
            Err(err) => {
                failures += 1;
                eprintln!("{} {:#}", "Error:".red(), err);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} queries failed", failures);
    }
    Ok(())
}
