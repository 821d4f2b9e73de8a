// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted embedder shared by the integration tests.
//!
//! Every catalog item gets its own axis in the name space and another in the
//! full-text space, so a query vector can be dialled to an exact cosine score
//! against any item.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use menusearch::catalog::Catalog;
use menusearch::embedding::{EmbeddingClient, EmbeddingProvider};
use menusearch::normalize::normalize;

pub const CATALOG: &str = r#"{"items": [
    {"id": "main_016", "name_ar": "برجر لحم بالجبن", "name_en": "Cheese Burger",
     "price": 47, "category": "main_dishes", "description_ar": "شريحة لحم بقري مع جبن شيدر"},
    {"id": "main_015", "name_ar": "برجر دجاج", "name_en": "Chicken Burger",
     "price": 38, "category": "main_dishes", "description_ar": "صدر دجاج مقرمش"},
    {"id": "bev_006", "name_ar": "عصير برتقال", "name_en": "Orange Juice",
     "price": {"صغير": 12, "وسط": 16, "كبير": 20}, "category": "beverages",
     "description_ar": "برتقال طازج معصور"},
    {"id": "des_002", "name_ar": "كنافة", "name_en": "Kunafa",
     "price": 28, "category": "desserts", "description_ar": "كنافة نابلسية بالجبن"}
]}"#;

/// Scores a query vector should have against item axes.
#[derive(Debug, Clone, Copy)]
pub enum Axis {
    Name(usize),
    Full(usize),
}

pub struct Script {
    items: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl Script {
    pub fn new(catalog: &Catalog) -> Self {
        let items = catalog.len();
        let mut script = Self {
            items,
            vectors: HashMap::new(),
        };
        for (i, item) in catalog.items().iter().enumerate() {
            let name = script.unit(Axis::Name(i));
            let full = script.unit(Axis::Full(i));
            script.vectors.insert(normalize(&item.name_text()), name);
            script.vectors.insert(normalize(&item.full_text()), full);
        }
        script
    }

    pub fn dimension(&self) -> usize {
        // names, full texts, four spare axes, one axis for unknown text
        self.items * 2 + 5
    }

    fn spare(&self, n: usize) -> usize {
        self.items * 2 + n
    }

    fn unknown_axis(&self) -> usize {
        self.items * 2 + 4
    }

    fn axis(&self, axis: Axis) -> usize {
        match axis {
            Axis::Name(i) => i,
            Axis::Full(i) => self.items + i,
        }
    }

    fn unit(&self, axis: Axis) -> Vec<f32> {
        let mut v = vec![0.0; self.dimension()];
        v[self.axis(axis)] = 1.0;
        v
    }

    /// Registers `query` with the given cosine scores; the remaining mass
    /// goes to a spare axis no item uses.
    pub fn query(mut self, query: &str, scores: &[(Axis, f32)]) -> Self {
        let mut v = vec![0.0; self.dimension()];
        let mut mass = 0.0f32;
        for &(axis, score) in scores {
            v[self.axis(axis)] = score;
            mass += score * score;
        }
        v[self.spare(0)] = (1.0 - mass).max(0.0).sqrt();
        self.vectors.insert(normalize(query), v);
        self
    }

    /// Registers `query` with an explicit raw vector over
    /// `[item axis, spare 0, spare 1, spare 2, spare 3]`.
    pub fn raw_query(mut self, query: &str, axis: Axis, components: [f32; 5]) -> Self {
        let mut v = vec![0.0; self.dimension()];
        v[self.axis(axis)] = components[0];
        for (n, value) in components[1..].iter().enumerate() {
            v[self.spare(n)] = *value;
        }
        self.vectors.insert(normalize(query), v);
        self
    }

    pub fn into_provider(self) -> (ScriptedProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            ScriptedProvider {
                unknown: {
                    let mut v = vec![0.0; self.dimension()];
                    v[self.unknown_axis()] = 1.0;
                    v
                },
                vectors: self.vectors,
                calls: calls.clone(),
                outage: Arc::new(AtomicBool::new(false)),
            },
            calls,
        )
    }
}

pub struct ScriptedProvider {
    vectors: HashMap<String, Vec<f32>>,
    unknown: Vec<f32>,
    calls: Arc<AtomicUsize>,
    outage: Arc<AtomicBool>,
}

impl EmbeddingProvider for ScriptedProvider {
    fn model_id(&self) -> &str {
        "scripted"
    }

    fn batch_size(&self) -> usize {
        100
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage.load(Ordering::SeqCst) {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| self.unknown.clone()))
            .collect())
    }
}

pub fn catalog() -> Catalog {
    Catalog::from_json_str(CATALOG).expect("catalog")
}

pub fn client(script: Script) -> (EmbeddingClient, Arc<AtomicUsize>) {
    let (provider, calls) = script.into_provider();
    (EmbeddingClient::new(Box::new(provider)), calls)
}

/// Client whose service can be taken down after the indexes are built.
pub fn flaky_client(script: Script) -> (EmbeddingClient, Arc<AtomicBool>) {
    let (provider, _) = script.into_provider();
    let outage = provider.outage.clone();
    (EmbeddingClient::new(Box::new(provider)), outage)
}
