// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog model and loading.
//!
//! A catalog is loaded once, validated, and then only read. Lookups by id go
//! through a prebuilt map; positions in `items()` are the positions used by
//! the vector indexes.

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{CatalogError, PriceError};

/// Size labels treated as the default when no size is requested.
const DEFAULT_SIZE_LABELS: &[&str] = &["وسط", "medium"];

/// Size label to price, in catalog order.
pub type SizeTable = IndexMap<String, f64>;

/// Price of an item: one value, or one value per size label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Flat(f64),
    Sized(SizeTable),
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Flat(value) => serialize_amount(value, serializer),
            Price::Sized(table) => serialize_sizes(table, serializer),
        }
    }
}

/// Whole amounts are written as integers, so `47` in the catalog stays `47`.
fn serialize_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

struct Amount(f64);

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_amount(&self.0, serializer)
    }
}

fn serialize_sizes<S: Serializer>(table: &SizeTable, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(table.iter().map(|(label, value)| (label, Amount(*value))))
}

fn serialize_optional_sizes<S: Serializer>(
    table: &Option<SizeTable>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match table {
        Some(table) => serialize_sizes(table, serializer),
        None => serializer.serialize_none(),
    }
}

impl Price {
    /// Resolves the price to charge for an optional size.
    ///
    /// A sized price uses the requested size when offered, otherwise the
    /// medium size, otherwise the first label. Asking for a size on a flat
    /// price is an error.
    pub fn resolve(&self, size: Option<&str>) -> Result<f64, PriceError> {
        match self {
            Price::Flat(value) => match size {
                Some(size) => Err(PriceError::SizeNotOffered(size.to_string())),
                None => Ok(*value),
            },
            Price::Sized(table) => resolve_sized(table, size),
        }
    }

    pub fn is_sized(&self) -> bool {
        matches!(self, Price::Sized(_))
    }
}

fn resolve_sized(table: &SizeTable, size: Option<&str>) -> Result<f64, PriceError> {
    if let Some(value) = size.and_then(|s| table.get(s)) {
        return Ok(*value);
    }
    DEFAULT_SIZE_LABELS
        .iter()
        .find_map(|label| table.get(*label))
        .or_else(|| table.values().next())
        .copied()
        .ok_or(PriceError::EmptySizes)
}

fn default_available() -> bool {
    true
}

/// One orderable catalog entry. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(alias = "name_ar")]
    pub name_primary: String,
    #[serde(default, alias = "name_en")]
    pub name_secondary: String,
    pub price: Price,
    pub category: String,
    #[serde(default, alias = "description_ar")]
    pub description: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_sizes"
    )]
    pub sizes: Option<SizeTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<serde_json::Value>,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl CatalogItem {
    /// Whether the caller has to pick a size before pricing this item.
    pub fn has_size_options(&self) -> bool {
        self.sizes.is_some() || self.price.is_sized()
    }

    /// Resolves the price for an optional size, consulting the separate
    /// `sizes` table when the price itself is flat.
    pub fn price_for(&self, size: Option<&str>) -> Result<f64, PriceError> {
        match (&self.price, &self.sizes) {
            (Price::Flat(_), Some(sizes)) if size.is_some() => resolve_sized(sizes, size),
            (price, _) => price.resolve(size),
        }
    }

    /// Text embedded into the name index.
    pub fn name_text(&self) -> String {
        format!("{} {}", self.name_primary, self.name_secondary)
    }

    /// Text embedded into the full index.
    pub fn full_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name_primary, self.name_secondary, self.description, self.category
        )
    }
}

/// Lookup view of an item, as handed to the ordering layer.
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetails {
    pub id: String,
    pub name_primary: String,
    pub name_secondary: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    #[serde(serialize_with = "serialize_sizes")]
    pub sizes: SizeTable,
    pub customizations: Vec<serde_json::Value>,
    pub available: bool,
}

impl From<&CatalogItem> for ItemDetails {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            name_primary: item.name_primary.clone(),
            name_secondary: item.name_secondary.clone(),
            price: item.price.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            sizes: item.sizes.clone().unwrap_or_default(),
            customizations: item.customizations.clone(),
            available: item.available,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { items: Vec<CatalogItem> },
    Bare(Vec<CatalogItem>),
}

/// The loaded, read-only catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    by_id: HashMap<String, usize>,
    source: PathBuf,
}

impl Catalog {
    /// Loads and validates a catalog document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()).into());
        }
        let content = fs::read_to_string(path)
            .map_err(|_| CatalogError::NotFound(path.to_path_buf()))?;
        let catalog = Self::parse(&content, path)?;
        info!(
            path = %path.display(),
            items = catalog.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Parses a catalog document held in memory.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::parse(json, Path::new("<memory>"))
    }

    fn parse(json: &str, path: &Path) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|source| CatalogError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let items = match document {
            CatalogDocument::Wrapped { items } | CatalogDocument::Bare(items) => items,
        };
        let mut catalog = Self::from_items(items)?;
        catalog.source = path.to_path_buf();
        Ok(catalog)
    }

    /// Builds a catalog from items, rejecting empty or duplicate ids.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(position));
            }
            if item.name_primary.trim().is_empty() {
                return Err(CatalogError::EmptyName(item.id.clone()));
            }
            if by_id.insert(item.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self {
            items,
            by_id,
            source: PathBuf::from("<memory>"),
        })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Where the catalog was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Item at an index position.
    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    /// Item with the given id, if any.
    pub fn get_by_id(&self, id: &str) -> Option<&CatalogItem> {
        self.by_id.get(id).and_then(|&pos| self.items.get(pos))
    }

    /// Distinct category names in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(item.category.as_str()))
            .map(|item| item.category.clone())
            .collect()
    }

    /// Checks the catalog for data-quality issues that do not prevent loading.
    pub fn validate(&self) -> CatalogReport {
        let mut category_counts: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            match category_counts.iter_mut().find(|(c, _)| *c == item.category) {
                Some((_, count)) => *count += 1,
                None => category_counts.push((item.category.clone(), 1)),
            }
        }

        let duplicate_primary = duplicates(self.items.iter().map(|i| i.name_primary.as_str()));
        let duplicate_secondary = duplicates(
            self.items
                .iter()
                .map(|i| i.name_secondary.as_str())
                .filter(|n| !n.is_empty()),
        );
        for name in duplicate_primary.iter().chain(&duplicate_secondary) {
            warn!(name = %name, "duplicate item name in catalog");
        }

        let mut missing_fields = Vec::new();
        for item in &self.items {
            if item.name_secondary.trim().is_empty() {
                missing_fields.push(format!("{}: missing name_secondary", item.id));
            }
            if item.description.trim().is_empty() {
                missing_fields.push(format!("{}: missing description", item.id));
            }
        }

        CatalogReport {
            total: self.items.len(),
            unavailable: self.items.iter().filter(|i| !i.available).count(),
            categories: category_counts
                .into_iter()
                .map(|(name, count)| CategoryCount { name, count })
                .collect(),
            duplicate_primary_names: duplicate_primary,
            duplicate_secondary_names: duplicate_secondary,
            missing_fields,
        }
    }
}

fn duplicates<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            out.push(name.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Result of [`Catalog::validate`].
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport {
    pub total: usize,
    pub unavailable: usize,
    pub categories: Vec<CategoryCount>,
    pub duplicate_primary_names: Vec<String>,
    pub duplicate_secondary_names: Vec<String>,
    pub missing_fields: Vec<String>,
}

impl CatalogReport {
    /// True when no duplicate names were found.
    pub fn is_clean(&self) -> bool {
        self.duplicate_primary_names.is_empty() && self.duplicate_secondary_names.is_empty()
    }
}
