//! The `Candidate` tagged record and its pure scoring functions.
//!
//! Kept free of `scraper`/DOM types on purpose so the scoring arithmetic
//! is testable in isolation from HTML traversal.

/// Provenance tag used both for ranking and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    JsonLd,
    RawJson,
    Custom,
    Selector,
    Text,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::JsonLd => "json-ld",
            Source::RawJson => "raw-json",
            Source::Custom => "custom",
            Source::Selector => "selector",
            Source::Text => "text",
        }
    }

    pub fn base_score(&self) -> i32 {
        match self {
            Source::JsonLd => 95,
            Source::RawJson => 88, // raw_json.rs overrides per-pattern
            Source::Custom => 88,
            Source::Selector => 60,
            Source::Text => 30,
        }
    }
}

/// A potential price reading with provenance and a cumulative score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub price: f64,
    pub currency: String,
    pub selector: String,
    pub source: Source,
    pub score: i32,
    pub snippet: String,
}

/// Dedup key: keep the highest-scoring candidate per `(selector, price,
/// currency)` triple.
pub fn dedup_key(c: &Candidate) -> (String, u64, String) {
    (c.selector.clone(), c.price.to_bits(), c.currency.clone())
}

pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    use std::collections::HashMap;
    let mut best: HashMap<(String, u64, String), Candidate> = HashMap::new();
    for c in candidates {
        let key = dedup_key(&c);
        match best.get(&key) {
            Some(existing) if existing.score >= c.score => {}
            _ => {
                best.insert(key, c);
            }
        }
    }
    best.into_values().collect()
}

/// Scoring adjustments applied to a candidate's snippet text.
pub fn text_signal_delta(text: &str) -> i32 {
    let t = text.to_ascii_lowercase();
    let mut delta = 0;

    if contains_any(&t, &["price", "fiyat", "sale", "deal", "current", "ourprice", "discount"]) {
        delta += 25;
    }
    if contains_any(
        &t,
        &["shipping", "delivery", "kargo", "installment", "taksit", "monthly", "save"],
    ) {
        delta -= 25;
    }
    if contains_any(&t, &["availability", "website", "url", "vat", "date", "mm/dd/yyyy"]) {
        delta -= 40;
    }
    if contains_any(
        &t,
        &["width", "height", "margin", "padding", "font", "button", "registry", "spacing"],
    ) {
        delta -= 45;
    }
    delta
}

/// Scoring adjustments applied to a candidate's selector string.
pub fn selector_signal_delta(selector: &str) -> i32 {
    let s = selector.to_ascii_lowercase();
    let mut delta = 0;

    if contains_any(&s, &["price", "fiyat", "ourprice", "deal", "sale", "discount"]) {
        delta += 18;
    }
    if contains_any(&s, &["old", "strike", "cross", "was", "list", "compare"]) {
        delta -= 20;
    }
    if is_wildcard_selector(&s) {
        delta -= 20;
    }
    delta
}

pub fn is_wildcard_selector(selector: &str) -> bool {
    let s = selector.to_ascii_lowercase();
    s.contains("[class*=\"price\"]") || s.contains("[id*=\"price\"]")
}

const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "TRY", "JPY", "CNY", "CAD", "AUD"];

/// Cumulative scoring adjustments that don't depend on text/selector
/// content: currency mismatch, price magnitude, supported-currency bonus.
pub fn numeric_signal_delta(price: f64, currency: &str, preferred_currency: &str, source: Source) -> i32 {
    let mut delta = 0;

    if currency != preferred_currency && source != Source::JsonLd {
        delta -= 12;
    }
    if price < 2.0 && source != Source::JsonLd {
        delta -= 50;
    }
    if SUPPORTED_CURRENCIES.contains(&currency) {
        delta += 8;
    }
    if price > 0.0 && price < 2_000_000.0 {
        delta += 5;
    }
    delta
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
