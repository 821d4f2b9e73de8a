// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog validation without embedding

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::Session;
use crate::cli::OutputFormat;
use menusearch::catalog::CatalogReport;
use menusearch::output::print_json;

/// Run the check command. Load errors propagate; data-quality findings
/// are reported but do not fail the command.
pub fn run(session: &Session, catalog: Option<&Path>) -> Result<()> {
    let path = session.catalog_path(catalog);
    let catalog = session.load_catalog(Some(path.as_path()))?;
    let report = catalog.validate();

    match session.format {
        OutputFormat::Json => print_json(&report, session.compact),
        OutputFormat::Text => {
            print_report(&path, &report);
            Ok(())
        }
    }
}

fn print_report(path: &Path, report: &CatalogReport) {
    let mark = if report.is_clean() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{} {}: {} items, {} unavailable",
        mark,
        path.display(),
        report.total,
        report.unavailable
    );
    for category in &report.categories {
        println!("  {:<24} {}", category.name, category.count);
    }
    for name in &report.duplicate_primary_names {
        println!("  {} duplicate name: {}", "!".yellow(), name);
    }
    for name in &report.duplicate_secondary_names {
        println!("  {} duplicate secondary name: {}", "!".yellow(), name);
    }
    if !report.missing_fields.is_empty() {
        println!("  {} items with missing optional fields:", report.missing_fields.len());
        for entry in &report.missing_fields {
            println!("    {}", entry.dimmed());
        }
    }
}
