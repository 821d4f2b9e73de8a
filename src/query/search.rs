// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot menu search

use anyhow::Result;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::Session;

/// Run the search command
pub fn run(
    session: &Session,
    query: &str,
    top_k: Option<usize>,
    catalog: Option<&Path>,
    no_cache: bool,
) -> Result<()> {
    let top_k = session.config.merge_top_k(top_k);
    let engine = session.build_engine(catalog)?;
    let searcher = session.searcher(engine, top_k, no_cache);

    let start = Instant::now();
    let response = searcher.search(query)?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        found = response.is_found(),
        "search finished"
    );

    session.print_response(&response)
}
