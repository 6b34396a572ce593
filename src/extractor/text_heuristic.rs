//! Last-resort text scan: walk up to 1,200 descendants of `<body>` looking
//! for short price-ish text fragments. Skipped entirely on Amazon hosts,
//! where it's far more likely to pick up installment or per-unit noise
//! than an actual price.

use scraper::{ElementRef, Html, Node, Selector};

use super::candidate::{Candidate, Source};
use super::currency::detect_from_text;
use super::normalize::{count_numeric_substrings, extract_numeric_substring, normalize_number};

const MAX_DESCENDANTS: usize = 1_200;
const MIN_FRAGMENT_LEN: usize = 2;
const MAX_FRAGMENT_LEN: usize = 140;

const PRICE_WORDS: &[&str] = &["price", "fiyat", "sale"];

pub fn collect(document: &Html, preferred_currency: &str) -> Vec<Candidate> {
    let body_selector = Selector::parse("body").unwrap();
    let Some(body) = document.select(&body_selector).next() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut scanned = 0usize;

    for node in body.descendants() {
        if scanned >= MAX_DESCENDANTS {
            break;
        }
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        scanned += 1;

        let text = direct_text(element);
        let text = text.trim();
        if text.chars().count() < MIN_FRAGMENT_LEN || text.chars().count() > MAX_FRAGMENT_LEN {
            continue;
        }

        let has_marker = detect_from_text(text).is_some();
        let has_price_word = {
            let lower = text.to_ascii_lowercase();
            PRICE_WORDS.iter().any(|w| lower.contains(w))
        };
        if !has_marker && !has_price_word {
            continue;
        }
        if count_numeric_substrings(text) > 2 && !has_marker {
            continue;
        }

        let Some(numeric) = extract_numeric_substring(text) else {
            continue;
        };
        let Some(price) = normalize_number(&numeric, preferred_currency) else {
            continue;
        };

        let currency = detect_from_text(text).unwrap_or(preferred_currency).to_string();

        out.push(Candidate {
            price,
            currency,
            selector: format!("text:{}", element.value().name()),
            source: Source::Text,
            score: Source::Text.base_score(),
            snippet: text.to_string(),
        });
    }

    out
}

/// Text directly owned by `element` (its text-node children), not text
/// inherited from nested descendants — avoids scoring the same number
/// once per ancestor on the way up.
fn direct_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(t.text.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn price_word_fragment_is_picked_up() {
        let html = r#"<html><body><span>Sale price $19.99</span></body></html>"#;
        let candidates = collect(&doc(html), "USD");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 19.99);
    }

    #[test]
    fn fragment_without_marker_or_price_word_is_skipped() {
        let html = r#"<html><body><span>SKU 00142-9988</span></body></html>"#;
        assert!(collect(&doc(html), "USD").is_empty());
    }

    #[test]
    fn overlong_fragment_is_skipped() {
        let html = format!(r#"<html><body><p>{}price $19.99</p></body></html>"#, "lorem ".repeat(30));
        assert!(collect(&doc(&html), "USD").is_empty());
    }

    #[test]
    fn currency_symbol_alone_is_sufficient_marker() {
        let html = r#"<html><body><span>₺1.299,90</span></body></html>"#;
        let candidates = collect(&doc(html), "TRY");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].currency, "TRY");
    }
}
