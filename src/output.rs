// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output and color utilities for consistent terminal formatting
//!
//! Provides shared color functions respecting NO_COLOR environment variable.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use crate::catalog::Price;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Serialize `value` to stdout, pretty unless `compact`.
pub fn print_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if compact {
        serde_json::to_writer(&mut out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Colorize item id (cyan)
pub fn colorize_id(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize score (yellow)
pub fn colorize_score(score: f32, use_color: bool) -> String {
    let text = format!("{:.2}", score);
    if use_color {
        text.yellow().to_string()
    } else {
        text
    }
}

/// Colorize item name (bold)
pub fn colorize_name(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize category or other secondary detail (dimmed)
pub fn colorize_detail(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize a confidence tier: high green, medium yellow, anything else red
pub fn colorize_confidence(tier: &str, use_color: bool) -> String {
    if !use_color {
        return tier.to_string();
    }
    match tier {
        "high" => tier.green().bold().to_string(),
        "medium" => tier.yellow().bold().to_string(),
        _ => tier.red().bold().to_string(),
    }
}

/// Human-readable price: `47` or `صغير 8 / وسط 12 / كبير 15`
pub fn format_price(price: &Price) -> String {
    match price {
        Price::Flat(value) => format_amount(*value),
        Price::Sized(sizes) => sizes
            .iter()
            .map(|(label, value)| format!("{} {}", label, format_amount(*value)))
            .collect::<Vec<_>>()
            .join(" / "),
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
