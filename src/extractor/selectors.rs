//! Selector-driven candidate collection: custom-selector probes built from
//! the caller's `selectorHint`, plus the merged site-adapter/generic-base
//! selector set.

use scraper::{ElementRef, Html, Selector};

use super::candidate::{Candidate, Source};
use super::currency::detect_from_text;
use super::normalize::{count_numeric_substrings, extract_numeric_substring, normalize_number};
use super::site_adapters::{adapter_selectors, is_amazon_host, GENERIC_BASE_SELECTORS};

/// `selectorHint` tried verbatim, then as an id, a class, and the two
/// common test-id attribute conventions.
fn custom_probe_selectors(hint: &str) -> Vec<String> {
    vec![
        hint.to_string(),
        format!("#{hint}"),
        format!(".{hint}"),
        format!(r#"[data-test-id="{hint}"]"#),
        format!(r#"[data-testid="{hint}"]"#),
    ]
}

/// Candidates from the caller-supplied selector hint, if any. Score 88.
pub fn collect_custom(document: &Html, hint: Option<&str>, host: &str, preferred_currency: &str) -> Vec<Candidate> {
    let Some(hint) = hint else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for raw_selector in custom_probe_selectors(hint) {
        let Ok(parsed) = Selector::parse(&raw_selector) else {
            continue;
        };
        for element in document.select(&parsed) {
            if let Some(candidate) =
                build_candidate(element, &raw_selector, Source::Custom, host, preferred_currency)
            {
                out.push(candidate);
            }
        }
    }
    out
}

/// Candidates from the site-adapter + generic base selector set. On Amazon
/// hosts the set is pruned to Amazon-specific and meta selectors only.
pub fn collect_site_and_generic(document: &Html, host: &str, preferred_currency: &str) -> Vec<Candidate> {
    let adapter = adapter_selectors(host);

    let selectors: Vec<&str> = if is_amazon_host(host) {
        adapter
            .iter()
            .copied()
            .chain(GENERIC_BASE_SELECTORS.iter().copied().filter(|s| s.starts_with("meta")))
            .collect()
    } else {
        adapter.iter().copied().chain(GENERIC_BASE_SELECTORS.iter().copied()).collect()
    };

    let mut out = Vec::new();
    for raw_selector in selectors {
        let Ok(parsed) = Selector::parse(raw_selector) else {
            continue;
        };
        for element in document.select(&parsed) {
            if let Some(candidate) = build_candidate(element, raw_selector, Source::Selector, host, preferred_currency)
            {
                out.push(candidate);
            }
        }
    }
    out
}

fn build_candidate(
    element: ElementRef,
    selector: &str,
    source: Source,
    host: &str,
    preferred_currency: &str,
) -> Option<Candidate> {
    let raw_text = element
        .value()
        .attr("content")
        .or_else(|| element.value().attr("data-price"))
        .or_else(|| element.value().attr("aria-label"))
        .map(str::to_string)
        .unwrap_or_else(|| element.text().collect::<String>());

    let raw_text = raw_text.trim();
    if raw_text.is_empty() || raw_text.len() > 220 {
        return None;
    }

    if count_numeric_substrings(raw_text) > 2 && detect_from_text(raw_text).is_none() {
        return None;
    }

    let currency = detect_from_text(raw_text).unwrap_or(preferred_currency).to_string();
    let numeric = extract_numeric_substring(raw_text)?;
    let price = normalize_number(&numeric, preferred_currency)?;

    let _ = host; // reserved for future per-host candidate tweaks

    Some(Candidate {
        price,
        currency,
        selector: selector.to_string(),
        source,
        score: source.base_score(),
        snippet: raw_text.to_string(),
    })
}
