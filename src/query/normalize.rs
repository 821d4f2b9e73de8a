// SPDX-License-Identifier: MIT OR Apache-2.0

//! Print the canonical form of a text

use anyhow::Result;
use serde::Serialize;

use super::Session;
use crate::cli::OutputFormat;
use menusearch::output::print_json;

#[derive(Debug, Serialize)]
struct NormalizeResult<'a> {
    input: &'a str,
    normalized: String,
}

/// Run the normalize command
pub fn run(session: &Session, text: &str) -> Result<()> {
    let normalized = menusearch::normalize::normalize(text);
    match session.format {
        OutputFormat::Json => print_json(
            &NormalizeResult {
                input: text,
                normalized,
            },
            session.compact,
        ),
        OutputFormat::Text => {
            println!("{}", normalized);
            Ok(())
        }
    }
}
