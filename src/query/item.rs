// SPDX-License-Identifier: MIT OR Apache-2.0

//! Item lookup by id

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::Session;
use crate::cli::OutputFormat;
use menusearch::catalog::ItemDetails;
use menusearch::output::{
    colorize_detail, colorize_id, colorize_name, format_price, print_json, use_colors,
};

#[derive(Debug, Serialize)]
struct MissingItem<'a> {
    found: bool,
    id: &'a str,
}

/// Run the item command. Returns whether the id exists.
pub fn run(session: &Session, id: &str, catalog: Option<&Path>) -> Result<bool> {
    let catalog = session.load_catalog(catalog)?;
    let details = catalog.get_by_id(id).map(ItemDetails::from);

    match session.format {
        OutputFormat::Json => match &details {
            Some(details) => print_json(details, session.compact)?,
            None => print_json(&MissingItem { found: false, id }, session.compact)?,
        },
        OutputFormat::Text => {
            let use_color = use_colors();
            match &details {
                Some(details) => print_details(details, use_color),
                None => println!("{} No item with id: {}", "✗".red(), id.yellow()),
            }
        }
    }

    Ok(details.is_some())
}

fn print_details(item: &ItemDetails, use_color: bool) {
    println!(
        "{}  {}",
        colorize_name(&item.name_primary, use_color),
        colorize_id(&item.id, use_color)
    );
    if !item.name_secondary.is_empty() {
        println!("  {}", item.name_secondary);
    }
    println!("  Price:     {}", format_price(&item.price));
    println!("  Category:  {}", item.category);
    if !item.description.is_empty() {
        println!("  {}", colorize_detail(&item.description, use_color));
    }
    if !item.sizes.is_empty() {
        let sizes: Vec<String> = item
            .sizes
            .iter()
            .map(|(label, price)| format!("{} {}", label, price))
            .collect();
        println!("  Sizes:     {}", sizes.join(", "));
    }
    if !item.customizations.is_empty() {
        println!("  Options:   {}", item.customizations.len());
    }
    if !item.available {
        println!("  {}", "currently unavailable".red());
    }
}
