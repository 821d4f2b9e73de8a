// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonicalisation of catalog and query text.
//!
//! Catalog entries are normalised once when the indexes are built and every
//! query goes through the exact same pipeline at search time, so both sides
//! of a comparison always live in the same canonical space.
//!
//! Stages, in order:
//! 1. strip optional vowel/tone marks
//! 2. drop elongation (tatweel)
//! 3. fold letter-shape variants (alef forms, hamza carriers, teh marbuta)
//! 4. decompose lam-alef ligatures
//! 5. phonetic folding: dialect letter confusions, then known spelling
//!    variants of food words
//! 6. whitespace collapse and case folding

use once_cell::sync::Lazy;
use std::collections::HashMap;

const TATWEEL: char = '\u{0640}';
const ALEF: char = '\u{0627}';
const HAMZA: char = '\u{0621}';
const HEH: char = '\u{0647}';
const YEH: char = '\u{064A}';
const KAF: char = '\u{0643}';

/// Letters that sound alike across dialects. The first element of each pair
/// is the canonical letter every variant collapses to.
const PHONETIC_LETTERS: &[(char, &[char])] = &[
    // jeem / qaf / kaf: برقر, بركر -> برجر
    ('\u{062C}', &['\u{0642}', '\u{0643}']),
    // zain / seen / thal: بيتسا -> بيتزا
    ('\u{0632}', &['\u{0633}', '\u{0630}']),
    // alef / alef maqsura
    ('\u{0627}', &['\u{0649}']),
];

/// Known spellings of borrowed and dialect food words, canonical first.
const FOOD_SPELLINGS: &[(&str, &[&str])] = &[
    ("برجر", &["برقر", "بركر", "برغر", "بيرجر", "بورجر"]),
    ("بيتزا", &["بيتسا", "بيتزه", "بيتزة"]),
    ("شاورما", &["شورما", "شوارما", "شويرما", "شاورمه"]),
    ("كابتشينو", &["كبتشينو", "كابوتشينو", "كابتشينه"]),
    ("سندويش", &["سندوتش", "ساندويش", "سندويتش"]),
    ("بطاطس", &["بطاطا", "بطاطص"]),
    ("همبرجر", &["هامبرجر", "همبرقر", "هامبورجر", "هامبورغر"]),
];

/// Spelling table folded into the same letter space the word pass sees.
struct SpellingTable {
    exact: HashMap<String, String>,
    /// Longest variant first so a longer spelling wins over one it contains.
    by_length: Vec<(String, String)>,
}

static SPELLINGS: Lazy<SpellingTable> = Lazy::new(|| {
    let mut exact = HashMap::new();
    let mut by_length = Vec::new();
    for (canonical, variants) in FOOD_SPELLINGS {
        let canonical = fold_letters(canonical);
        for variant in *variants {
            let variant = fold_letters(variant);
            // Variants the letter pass already resolves need no entry.
            if variant == canonical {
                continue;
            }
            exact.insert(variant.clone(), canonical.clone());
            by_length.push((variant, canonical.clone()));
        }
    }
    by_length.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    SpellingTable { exact, by_length }
});

/// Normalizes text into its canonical form.
///
/// Pure, total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
/// Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded = fold_letters(text);
    let words: Vec<String> = folded.split_whitespace().map(fix_spelling).collect();
    words.join(" ").to_lowercase()
}

/// Stages 1-5a: character-level folding.
fn fold_letters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_diacritic(ch) || ch == TATWEEL {
            continue;
        }
        if let Some(expanded) = decompose_ligature(ch) {
            out.push_str(expanded);
            continue;
        }
        out.push(phonetic_letter(letter_shape(ch)));
    }
    out
}

/// Stage 5b: replace known misspellings of a single word.
fn fix_spelling(word: &str) -> String {
    let table = &*SPELLINGS;
    let mut current = word.to_string();
    // Runs to a fixpoint. The pass bound only guards against a table whose
    // canonical forms reintroduce one of its variants.
    for _ in 0..=word.chars().count() {
        let next = match table.exact.get(&current) {
            Some(canonical) => canonical.clone(),
            None => table
                .by_length
                .iter()
                .filter(|(variant, _)| current.contains(variant.as_str()))
                .fold(current.clone(), |text, (variant, canonical)| {
                    text.replace(variant.as_str(), canonical)
                }),
        };
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn is_diacritic(ch: char) -> bool {
    matches!(ch,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}')
}

fn letter_shape(ch: char) -> char {
    match ch {
        // آ أ إ ٱ ٲ ٳ
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' | '\u{0672}' | '\u{0673}' => ALEF,
        // ؤ ئ
        '\u{0624}' | '\u{0626}' => HAMZA,
        // ة
        '\u{0629}' => HEH,
        // Persian keheh and yeh
        '\u{06A9}' => KAF,
        '\u{06CC}' => YEH,
        other => other,
    }
}

fn decompose_ligature(ch: char) -> Option<&'static str> {
    match ch {
        // lam-alef in all its presentation forms
        '\u{FEF5}'..='\u{FEFC}' => Some("\u{0644}\u{0627}"),
        // ﷲ
        '\u{FDF2}' => Some("\u{0627}\u{0644}\u{0644}\u{0647}"),
        _ => None,
    }
}

fn phonetic_letter(ch: char) -> char {
    PHONETIC_LETTERS
        .iter()
        .find(|(_, variants)| variants.contains(&ch))
        .map(|(canonical, _)| *canonical)
        .unwrap_or(ch)
}

/// Every `(variant, canonical)` pair of the built-in spelling tables, in raw
/// (unnormalised) form.
pub fn known_variant_pairs() -> Vec<(&'static str, &'static str)> {
    let mut pairs = Vec::new();
    for (canonical, variants) in FOOD_SPELLINGS {
        for variant in *variants {
            pairs.push((*variant, *canonical));
        }
    }
    pairs
}
