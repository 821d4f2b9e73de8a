// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search results handed to the ordering layer.
//!
//! [`SearchResponse`] is the only contract with callers. On the wire it
//! flattens into a single JSON object keyed by `found`.

use serde::ser::Serializer;
use serde::Serialize;

use crate::catalog::{CatalogItem, Price};

/// Confidence tier derived from the best name-index score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// What the caller should do with a found response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddDirectly,
    ShowOptions,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AddDirectly => "add_directly",
            Action::ShowOptions => "show_options",
        }
    }
}

/// Which stage of the funnel produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Name index, high or medium tier.
    Names,
    /// Merged name and full-index hits after a low name score.
    Descriptions,
    /// Lexical fallback.
    Keywords,
}

/// One candidate item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "id")]
    pub item_id: String,
    pub name_primary: String,
    pub name_secondary: String,
    pub price: Price,
    pub category: String,
    pub has_size_options: bool,
    pub score: f32,
}

impl SearchResult {
    /// Builds a result, clamping the score to `[0, 1]` and rounding it to two
    /// decimals.
    pub fn from_item(item: &CatalogItem, score: f32) -> Self {
        Self {
            item_id: item.id.clone(),
            name_primary: item.name_primary.clone(),
            name_secondary: item.name_secondary.clone(),
            price: item.price.clone(),
            category: item.category.clone(),
            has_size_options: item.has_size_options(),
            score: round_score(score),
        }
    }
}

fn round_score(score: f32) -> f32 {
    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub confidence: Confidence,
    pub action: Action,
    pub source: MatchSource,
    /// Never empty.
    pub items: Vec<SearchResult>,
    pub instruction: String,
}

impl Found {
    /// Primary name of the best candidate.
    pub fn top_match(&self) -> &str {
        self.items
            .first()
            .map(|item| item.name_primary.as_str())
            .unwrap_or_default()
    }

    /// Instruction for the ordering layer, phrased around `query`.
    pub fn compose_instruction(&self, query: &str) -> String {
        match (self.confidence, self.source) {
            (Confidence::High, _) => {
                let percent = self
                    .items
                    .first()
                    .map(|item| (item.score * 100.0).round() as u32)
                    .unwrap_or_default();
                format!(
                    "High-confidence match: '{}' ({}%). Add it to the order directly.",
                    self.top_match(),
                    percent
                )
            }
            (Confidence::Medium, _) => format!(
                "Several close matches for '{}'. Show them to the customer and ask which one they want.",
                query
            ),
            (Confidence::Low, MatchSource::Keywords) => format!(
                "These items contain '{}'. Show them and let the customer choose.",
                query
            ),
            (Confidence::Low, _) => format!(
                "'{}' is not on the menu exactly. Offer these related items instead.",
                query
            ),
        }
    }
}

/// Nothing matched at any stage.
#[derive(Debug, Clone, PartialEq)]
pub struct NotFound {
    pub query: String,
    pub suggested_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    Found(Found),
    NotFound(NotFound),
}

impl SearchResponse {
    /// The same answer addressed to `query`, typically another spelling of
    /// the query it was computed for. Used when serving a cached response.
    pub fn readdressed(self, query: &str) -> Self {
        match self {
            SearchResponse::Found(mut found) => {
                found.instruction = found.compose_instruction(query);
                SearchResponse::Found(found)
            }
            SearchResponse::NotFound(mut not_found) => {
                not_found.query = query.to_string();
                SearchResponse::NotFound(not_found)
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchResponse::Found(_))
    }

    pub fn items(&self) -> &[SearchResult] {
        match self {
            SearchResponse::Found(found) => &found.items,
            SearchResponse::NotFound(_) => &[],
        }
    }

    /// `"high" | "medium" | "low" | "none"`.
    pub fn confidence_str(&self) -> &'static str {
        match self {
            SearchResponse::Found(found) => found.confidence.as_str(),
            SearchResponse::NotFound(_) => "none",
        }
    }

    /// `"add_directly" | "show_options" | "inform_not_available"`.
    pub fn action_str(&self) -> &'static str {
        match self {
            SearchResponse::Found(found) => found.action.as_str(),
            SearchResponse::NotFound(_) => "inform_not_available",
        }
    }
}

#[derive(Serialize)]
struct WireResponse<'a> {
    found: bool,
    confidence: &'static str,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a [SearchResult]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_match: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    searched_descriptions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_categories: Option<&'a [String]>,
}

impl Serialize for SearchResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            SearchResponse::Found(found) => WireResponse {
                found: true,
                confidence: found.confidence.as_str(),
                action: found.action.as_str(),
                count: Some(found.items.len()),
                items: Some(&found.items),
                top_match: Some(found.top_match()),
                searched_descriptions: (found.source == MatchSource::Descriptions).then_some(true),
                match_type: (found.source == MatchSource::Keywords).then_some("keyword_fallback"),
                instruction: Some(&found.instruction),
                query: None,
                available_categories: None,
            },
            SearchResponse::NotFound(missing) => WireResponse {
                found: false,
                confidence: "none",
                action: "inform_not_available",
                count: None,
                items: None,
                top_match: None,
                searched_descriptions: None,
                match_type: None,
                instruction: None,
                query: Some(&missing.query),
                available_categories: Some(&missing.suggested_categories),
            },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn burger() -> CatalogItem {
        serde_json::from_value(json!({
            "id": "main_016", "name_ar": "برجر لحم بالجبن", "name_en": "Cheese Burger",
            "price": 47, "category": "main_dishes"
        }))
        .unwrap()
    }

    #[test]
    fn scores_are_rounded_and_clamped() {
        assert_eq!(SearchResult::from_item(&burger(), 0.8812).score, 0.88);
        assert_eq!(SearchResult::from_item(&burger(), 1.0000002).score, 1.0);
        assert_eq!(SearchResult::from_item(&burger(), -0.2).score, 0.0);
    }

    #[test]
    fn found_serializes_flat() {
        let response = SearchResponse::Found(Found {
            confidence: Confidence::High,
            action: Action::AddDirectly,
            source: MatchSource::Names,
            items: vec![SearchResult::from_item(&burger(), 0.88)],
            instruction: "add".into(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["found"], true);
        assert_eq!(value["confidence"], "high");
        assert_eq!(value["action"], "add_directly");
        assert_eq!(value["count"], 1);
        assert_eq!(value["items"][0]["id"], "main_016");
        assert_eq!(value["items"][0]["price"], 47);
        assert!(value["items"][0]["price"].is_i64());
        assert_eq!(value["top_match"], "برجر لحم بالجبن");
        assert!(value.get("searched_descriptions").is_none());
        assert!(value.get("query").is_none());
    }

    #[test]
    fn readdressing_rewrites_query_text_only() {
        let found = Found {
            confidence: Confidence::Medium,
            action: Action::ShowOptions,
            source: MatchSource::Names,
            items: vec![SearchResult::from_item(&burger(), 0.6)],
            instruction: String::new(),
        };
        let first = SearchResponse::Found(Found {
            instruction: found.compose_instruction("برجر"),
            ..found.clone()
        });
        let SearchResponse::Found(again) = first.clone().readdressed("برقر") else {
            panic!("expected a match");
        };
        assert!(again.instruction.contains("'برقر'"));
        assert_eq!(again.items, found.items);

        let missing = SearchResponse::NotFound(NotFound {
            query: "سوشي".into(),
            suggested_categories: vec!["main_dishes".into()],
        });
        let SearchResponse::NotFound(missing) = missing.readdressed("سوشى") else {
            panic!("expected not found");
        };
        assert_eq!(missing.query, "سوشى");
        assert_eq!(missing.suggested_categories, vec!["main_dishes"]);
    }

    #[test]
    fn high_instruction_names_the_item() {
        let found = Found {
            confidence: Confidence::High,
            action: Action::AddDirectly,
            source: MatchSource::Names,
            items: vec![SearchResult::from_item(&burger(), 0.88)],
            instruction: String::new(),
        };
        assert_eq!(
            found.compose_instruction("anything"),
            "High-confidence match: 'برجر لحم بالجبن' (88%). Add it to the order directly."
        );
    }

    #[test]
    fn fallback_sources_are_flagged() {
        let mut found = Found {
            confidence: Confidence::Low,
            action: Action::ShowOptions,
            source: MatchSource::Descriptions,
            items: vec![SearchResult::from_item(&burger(), 0.4)],
            instruction: String::new(),
        };
        let value = serde_json::to_value(SearchResponse::Found(found.clone())).unwrap();
        assert_eq!(value["searched_descriptions"], true);

        found.source = MatchSource::Keywords;
        let value = serde_json::to_value(SearchResponse::Found(found)).unwrap();
        assert_eq!(value["match_type"], "keyword_fallback");
    }

    #[test]
    fn not_found_serializes_categories() {
        let response = SearchResponse::NotFound(NotFound {
            query: "سوشي".into(),
            suggested_categories: vec!["main_dishes".into()],
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["found"], false);
        assert_eq!(value["confidence"], "none");
        assert_eq!(value["action"], "inform_not_available");
        assert_eq!(value["query"], "سوشي");
        assert_eq!(value["available_categories"][0], "main_dishes");
        assert!(value.get("items").is_none());
        assert!(response.items().is_empty());
    }
}
