// SPDX-License-Identifier: MIT OR Apache-2.0

mod common;

use common::{catalog, client, flaky_client, Axis, Script};
use menusearch::cache::{CachedSearcher, ManualClock, ResultCache};
use menusearch::catalog::Catalog;
use menusearch::embedding::{EmbeddingClient, HashedNgramProvider};
use menusearch::engine::{SearchEngine, Thresholds};
use menusearch::normalize::normalize;
use menusearch::response::{Action, Confidence, MatchSource, SearchResponse};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn engine(script: Script) -> SearchEngine {
    let (client, _) = client(script);
    SearchEngine::new(catalog(), client).expect("engine")
}

fn ids(response: &SearchResponse) -> Vec<&str> {
    response.items().iter().map(|i| i.item_id.as_str()).collect()
}

#[test]
fn high_boundary_is_inclusive() {
    // (3, 2, 1, 1, 1) / 4 has an exact cosine of 0.75 against the item axis
    let script = Script::new(&catalog()).raw_query("برجر", Axis::Name(0), [3.0, 2.0, 1.0, 1.0, 1.0]);
    let response = engine(script).search("برجر", 5).unwrap();
    match &response {
        SearchResponse::Found(found) => {
            assert_eq!(found.confidence, Confidence::High);
            assert_eq!(found.action, Action::AddDirectly);
            assert_eq!(found.items.len(), 1);
            assert_eq!(found.items[0].item_id, "main_016");
            assert_eq!(found.items[0].score, 0.75);
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn just_below_high_is_medium() {
    let script = Script::new(&catalog()).query("برجر", &[(Axis::Name(0), 0.749999)]);
    let response = engine(script).search("برجر", 5).unwrap();
    assert_eq!(response.confidence_str(), "medium");
    assert_eq!(response.action_str(), "show_options");
    assert_eq!(ids(&response), vec!["main_016"]);
}

#[test]
fn medium_returns_every_hit_above_cutoff() {
    let script = Script::new(&catalog()).query(
        "برجر",
        &[
            (Axis::Name(0), 0.6),
            (Axis::Name(1), 0.56),
            (Axis::Name(3), 0.5),
        ],
    );
    let response = engine(script).search("برجر", 5).unwrap();
    assert_eq!(response.confidence_str(), "medium");
    assert_eq!(ids(&response), vec!["main_016", "main_015"]);
}

#[test]
fn low_merges_names_and_descriptions() {
    let script = Script::new(&catalog()).query(
        "شي بالجبن",
        &[
            (Axis::Name(0), 0.5),
            (Axis::Name(1), 0.32),
            (Axis::Name(2), 0.29),
            (Axis::Full(3), 0.4),
            (Axis::Full(0), 0.45),
            (Axis::Full(2), 0.34),
        ],
    );
    let response = engine(script).search("شي بالجبن", 5).unwrap();
    match &response {
        SearchResponse::Found(found) => {
            assert_eq!(found.confidence, Confidence::Low);
            assert_eq!(found.action, Action::ShowOptions);
            assert_eq!(found.source, MatchSource::Descriptions);
            // main_016 keeps its name score; juice is below both cutoffs
            assert_eq!(ids(&response), vec!["main_016", "des_002", "main_015"]);
            assert_eq!(found.items[0].score, 0.5);
        }
        other => panic!("expected a match, got {other:?}"),
    }
    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["searched_descriptions"], true);
}

#[test]
fn low_merge_respects_top_k() {
    let script = Script::new(&catalog()).query(
        "شي",
        &[
            (Axis::Full(0), 0.4),
            (Axis::Full(1), 0.4),
            (Axis::Full(2), 0.4),
        ],
    );
    let response = engine(script).search("شي", 2).unwrap();
    // equal scores keep catalog order
    assert_eq!(ids(&response), vec!["main_016", "main_015"]);
}

#[test]
fn keyword_fallback_when_vectors_miss() {
    let script = Script::new(&catalog());
    let response = engine(script).search("كنافه بالقشطه", 5).unwrap();
    match &response {
        SearchResponse::Found(found) => {
            assert_eq!(found.source, MatchSource::Keywords);
            assert_eq!(found.confidence, Confidence::Low);
            assert_eq!(found.items[0].item_id, "des_002");
        }
        other => panic!("expected keyword match, got {other:?}"),
    }
    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["match_type"], "keyword_fallback");
}

#[test]
fn nothing_anywhere_is_not_found() {
    let script = Script::new(&catalog());
    let response = engine(script).search("سوشي", 5).unwrap();
    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["found"], false);
    assert_eq!(json["action"], "inform_not_available");
    assert_eq!(json["query"], "سوشي");
    assert_eq!(
        json["available_categories"],
        serde_json::json!(["main_dishes", "beverages", "desserts"])
    );
}

#[test]
fn empty_query_skips_the_embedding_service() {
    let (client, calls) = client(Script::new(&catalog()));
    let engine = SearchEngine::new(catalog(), client).unwrap();
    let after_build = calls.load(Ordering::SeqCst);
    let response = engine.search("  \u{064E} ", 5).unwrap();
    assert!(!response.is_found());
    assert_eq!(calls.load(Ordering::SeqCst), after_build);
}

#[test]
fn embedding_failures_propagate() {
    struct Down;
    impl menusearch::embedding::EmbeddingProvider for Down {
        fn model_id(&self) -> &str {
            "down"
        }
        fn batch_size(&self) -> usize {
            10
        }
        fn embed_texts(&self, _: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("503 Service Unavailable")
        }
    }
    let result = SearchEngine::new(catalog(), EmbeddingClient::new(Box::new(Down)));
    assert!(result.is_err());
}

#[test]
fn query_time_outage_fails_every_search() {
    let script = Script::new(&catalog()).query("برجر لحم", &[(Axis::Name(0), 0.88)]);
    let (client, outage) = flaky_client(script);
    let engine = Arc::new(SearchEngine::new(catalog(), client).unwrap());
    assert!(engine.search("برجر لحم", 5).unwrap().is_found());

    outage.store(true, Ordering::SeqCst);
    let err = engine.search("برجر لحم", 5).unwrap_err();
    assert!(format!("{err:#}").contains("503"));
    assert!(engine.search("برجر لحم", 5).is_err());

    let clock = Arc::new(ManualClock::new(0));
    let searcher = CachedSearcher::new(engine, ResultCache::new(clock, 300, 128), 5);
    assert!(searcher.search("كنافة").is_err());
    assert!(searcher.search("كنافة").is_err());
    let stats = searcher.stats().unwrap();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.misses, 2);

    outage.store(false, Ordering::SeqCst);
    assert!(searcher.search("كنافة").is_ok());
    assert_eq!(searcher.stats().unwrap().entries, 1);
}

#[test]
fn custom_thresholds_are_honoured() {
    let script = Script::new(&catalog()).query("برجر", &[(Axis::Name(0), 0.6)]);
    let (client, _) = client(script);
    let thresholds = Thresholds {
        high: 0.5,
        ..Thresholds::default()
    };
    let engine = SearchEngine::build(catalog(), client, thresholds, None).unwrap();
    let response = engine.search("برجر", 5).unwrap();
    assert_eq!(response.action_str(), "add_directly");
}

#[test]
fn lookup_returns_loaded_items() {
    let engine = engine(Script::new(&catalog()));
    for item in catalog().items() {
        assert_eq!(engine.get_item_by_id(&item.id), Some(item));
    }
    assert!(engine.get_item_by_id("main_999").is_none());
    assert!(engine.get_item_by_id("").is_none());
}

#[test]
fn menu_scenario() {
    let script = Script::new(&catalog())
        .query("برجر لحم", &[(Axis::Name(0), 0.88)])
        .query("برقر", &[(Axis::Name(0), 0.60)]);
    let engine = engine(script);

    let json = serde_json::to_value(engine.search("برجر لحم", 5).unwrap()).unwrap();
    assert_eq!(json["found"], true);
    assert_eq!(json["confidence"], "high");
    assert_eq!(json["action"], "add_directly");
    assert_eq!(json["items"][0]["id"], "main_016");
    assert_eq!(json["items"][0]["price"], 47);
    assert!((json["items"][0]["score"].as_f64().unwrap() - 0.88).abs() < 1e-6);

    // "برقر" and "برجر" share a canonical form, so they share a vector too
    assert_eq!(normalize("برقر"), normalize("برجر"));
    let json = serde_json::to_value(engine.search("برقر", 5).unwrap()).unwrap();
    assert_eq!(json["confidence"], "medium");
    assert_eq!(json["action"], "show_options");

    let json = serde_json::to_value(engine.search("سوشي", 5).unwrap()).unwrap();
    assert_eq!(json["found"], false);
    assert_eq!(json["action"], "inform_not_available");
}

#[test]
fn exact_primary_name_finds_itself() {
    let catalog = Catalog::from_json_str(
        r#"[{"id": "a", "name_ar": "كبسة لحم", "price": 65, "category": "main"},
            {"id": "b", "name_ar": "مندي دجاج", "price": 45, "category": "main"},
            {"id": "c", "name_ar": "شيش طاووق", "price": 42, "category": "main"},
            {"id": "d", "name_ar": "قهوة عربية", "price": 10, "category": "drinks"}]"#,
    )
    .unwrap();
    let client = EmbeddingClient::new(Box::new(HashedNgramProvider::new(512)));
    let engine = SearchEngine::new(catalog.clone(), client).unwrap();
    for item in catalog.items() {
        let response = engine.search(&item.name_primary, 5).unwrap();
        let top = &response.items()[0];
        assert_eq!(top.item_id, item.id);
        assert!(top.score >= 0.99, "{} scored {}", item.id, top.score);
    }
}
