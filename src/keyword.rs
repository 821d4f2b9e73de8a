// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic lexical matching over item names.
//!
//! Only consulted once both vector searches came back empty, to catch
//! spellings the embedding model places far from everything in the catalog.
//!
//! Scoring, per item, against the normalized query:
//! - exact match with the primary or secondary name: `1.0`
//! - one string contains the other: `min(0.95, 0.7 + 0.25 * shorter/longer)`
//! - shared whole words: `0.5 + 0.4 * shared / query_words`
//! - words (3+ chars) containing each other: `0.3 + 0.3 * partial / query_words`

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::normalize::normalize;

const MIN_PARTIAL_WORD_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct NameEntry {
    primary: String,
    secondary: String,
    words: HashSet<String>,
}

impl NameEntry {
    fn new(primary: &str, secondary: &str) -> Self {
        let primary = normalize(primary);
        let secondary = normalize(secondary);
        let words = primary
            .split_whitespace()
            .chain(secondary.split_whitespace())
            .map(str::to_string)
            .collect();
        Self {
            primary,
            secondary,
            words,
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        [self.primary.as_str(), self.secondary.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
    }
}

/// Lexical fallback matcher with names pre-normalized per catalog position.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    entries: Vec<NameEntry>,
}

impl KeywordMatcher {
    pub fn new(catalog: &Catalog) -> Self {
        let entries = catalog
            .items()
            .iter()
            .map(|item| NameEntry::new(&item.name_primary, &item.name_secondary))
            .collect();
        Self { entries }
    }

    /// Scores every item against an already normalized query and returns up
    /// to `top_k` `(score, position)` pairs, best first, ties in catalog
    /// order. Items with no overlap are left out.
    pub fn search(&self, normalized_query: &str, top_k: usize) -> Vec<(f32, usize)> {
        if normalized_query.is_empty() {
            return Vec::new();
        }
        let query_words: HashSet<&str> = normalized_query.split_whitespace().collect();

        let mut hits: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                score_entry(normalized_query, &query_words, entry).map(|score| (score, position))
            })
            .collect();
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        hits
    }
}

/// Scores a normalized query against one pair of names.
pub fn keyword_score(normalized_query: &str, primary: &str, secondary: &str) -> Option<f32> {
    if normalized_query.is_empty() {
        return None;
    }
    let query_words: HashSet<&str> = normalized_query.split_whitespace().collect();
    score_entry(
        normalized_query,
        &query_words,
        &NameEntry::new(primary, secondary),
    )
}

fn score_entry(query: &str, query_words: &HashSet<&str>, entry: &NameEntry) -> Option<f32> {
    if entry.names().any(|name| name == query) {
        return Some(1.0);
    }

    let containment = entry
        .names()
        .filter(|name| name.contains(query) || query.contains(name))
        .map(|name| {
            let (a, b) = (name.chars().count(), query.chars().count());
            let ratio = a.min(b) as f32 / a.max(b).max(1) as f32;
            (0.7 + 0.25 * ratio).min(0.95)
        })
        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))));
    if containment.is_some() {
        return containment;
    }

    let total = query_words.len().max(1) as f32;
    let shared = query_words
        .iter()
        .filter(|word| entry.words.contains(**word))
        .count();
    if shared > 0 {
        return Some(0.5 + 0.4 * (shared as f32 / total));
    }

    let partial = query_words
        .iter()
        .filter(|qword| qword.chars().count() >= MIN_PARTIAL_WORD_CHARS)
        .filter(|qword| {
            entry.words.iter().any(|nword| {
                nword.chars().count() >= MIN_PARTIAL_WORD_CHARS
                    && (nword.contains(**qword) || qword.contains(nword.as_str()))
            })
        })
        .count();
    if partial > 0 {
        return Some(0.3 + 0.3 * (partial as f32 / total));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn exact_match_scores_one() {
        assert_eq!(keyword_score("برجر لحم", "برجر لحم", ""), Some(1.0));
        assert_eq!(
            keyword_score("cheese burger", "برجر جبن", "Cheese Burger"),
            Some(1.0)
        );
    }

    #[test]
    fn containment_scales_with_overlap() {
        let score = keyword_score("برجر لحم", "برجر لحم بالجبن", "").unwrap();
        let q = "برجر لحم".chars().count() as f32;
        let n = "برجر لحم بالجبن".chars().count() as f32;
        assert!(approx(score, 0.7 + 0.25 * q / n));
        assert!(score <= 0.95);
    }

    #[test]
    fn containment_is_capped() {
        // near-identical lengths still stay below an exact match
        let score = keyword_score("abcdefghijklmnopqrstuvwxy", "abcdefghijklmnopqrstuvwxyz", "")
            .unwrap();
        assert!(score < 0.95);
        assert!(score > 0.9);
    }

    #[test]
    fn word_overlap_scores_by_ratio() {
        let one = keyword_score("لحم مشوي", "برجر لحم", "").unwrap();
        assert!(approx(one, 0.5 + 0.4 * 0.5));
        let two = keyword_score("لحم برجر", "برجر لحم", "").unwrap();
        assert!(approx(two, 0.9));
        assert!(two >= one);
    }

    #[test]
    fn partial_word_overlap() {
        let score = keyword_score("shawarm", "chicken shawarma", "").unwrap();
        assert!(score > 0.7); // contained in the name
        let score = keyword_score("shawarm wrap", "chicken shawarma", "").unwrap();
        assert!(approx(score, 0.3 + 0.3 * 0.5));
    }

    #[test]
    fn short_words_do_not_partially_match() {
        assert_eq!(keyword_score("ab xy", "abc xyz", ""), None);
    }

    #[test]
    fn no_overlap_is_excluded() {
        assert_eq!(keyword_score("سوشي", "برجر لحم", "Beef Burger"), None);
        assert_eq!(keyword_score("", "برجر", ""), None);
    }

    #[test]
    fn matcher_sorts_and_truncates() {
        let catalog = Catalog::from_json_str(
            r#"[{"id": "a", "name_ar": "برجر دجاج", "price": 1, "category": "c"},
                {"id": "b", "name_ar": "برجر", "price": 1, "category": "c"},
                {"id": "c", "name_ar": "عصير", "price": 1, "category": "c"},
                {"id": "d", "name_ar": "برجر لحم", "price": 1, "category": "c"}]"#,
        )
        .unwrap();
        let matcher = KeywordMatcher::new(&catalog);
        let hits = matcher.search(&normalize("برجر"), 5);
        let order: Vec<usize> = hits.iter().map(|h| h.1).collect();
        assert_eq!(order, vec![1, 3, 0]);
        assert_eq!(hits[0].0, 1.0);
        assert!(hits[1].0 > hits[2].0);

        assert_eq!(matcher.search(&normalize("برجر"), 1).len(), 1);
    }
}
