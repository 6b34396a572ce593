//! Evidence collection: walks meta tags, JSON-LD, textual selectors,
//! action elements, and variant structure, feeding everything into an
//! [`Evidence`] accumulator.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::aggregate::{BestSignal, Evidence};
use super::terms::{fuzzy_match, normalize};
use crate::extractor::site_adapters::is_amazon_host;

const TEXTUAL_SELECTORS: &[&str] = &[
    "#availability",
    "#availabilityInsideBuyBox_feature_div",
    "#outOfStock",
    "[itemprop=\"availability\"]",
    "[class*=\"stock\"]",
    "[class*=\"availability\"]",
    "[id*=\"stock\"]",
    "[id*=\"availability\"]",
    "[data-stock]",
    "[data-availability]",
];

const PURCHASE_ACTION_TOKENS: &[&str] = &[
    "add to cart",
    "buy now",
    "checkout",
    "sepete ekle",
    "hemen al",
    "satin al",
    "addtocart",
    "buynow",
];

const BUYING_OPTIONS_TOKENS: &[&str] = &["see all buying options", "satin alma seceneklerini gor"];

const NOTIFY_ME_TOKENS: &[&str] = &["notify me", "email me", "haber ver"];

const VARIANT_PROMPT_TOKENS: &[&str] = &[
    "select size",
    "choose size",
    "beden sec",
    "numara sec",
    "renk sec",
];

const VARIANT_ATTR_TOKENS: &[&str] = &["size", "beden", "numara", "renk", "color", "variant", "option"];

const MODIFIER_WORDS: &[&str] = &["shift", "alt", "ctrl", "cmd"];

pub fn collect(document: &Html, html: &str, host: &str) -> Evidence {
    let mut evidence = Evidence::default();
    let is_amazon = is_amazon_host(host);

    collect_structured_meta(document, &mut evidence);
    collect_structured_json_ld(html, &mut evidence);
    collect_textual_selectors(document, &mut evidence);
    collect_action_elements(document, &mut evidence, is_amazon);
    collect_variant_structure(document, &mut evidence);
    if is_amazon {
        collect_amazon_structures(document, &mut evidence);
    }

    evidence
}

fn collect_structured_meta(document: &Html, evidence: &mut Evidence) {
    for sel in [
        "meta[itemprop=availability]",
        "link[itemprop=availability]",
        "meta[property=\"product:availability\"]",
    ] {
        let Ok(selector) = Selector::parse(sel) else { continue };
        for el in document.select(&selector) {
            let value = el
                .value()
                .attr("content")
                .or_else(|| el.value().attr("href"))
                .unwrap_or_default();
            apply_structured_token(value, "meta-availability", evidence);
        }
    }
}

fn collect_structured_json_ld(html: &str, evidence: &mut Evidence) {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };
    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        walk_json_ld(&value, evidence);
    }
}

fn walk_json_ld(value: &Value, evidence: &mut Evidence) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| walk_json_ld(v, evidence)),
        Value::Object(map) => {
            for key in ["availability", "offerAvailability"] {
                if let Some(Value::String(s)) = map.get(key) {
                    apply_structured_token(s, "json-ld", evidence);
                }
            }
            for v in map.values() {
                walk_json_ld(v, evidence);
            }
        }
        _ => {}
    }
}

fn apply_structured_token(raw: &str, source: &str, evidence: &mut Evidence) {
    let token = raw.rsplit('/').next().unwrap_or(raw).to_ascii_lowercase();
    let token: String = token.chars().filter(|c| c.is_alphanumeric()).collect();

    const OOS_TOKENS: &[&str] = &[
        "outofstock",
        "soldout",
        "discontinued",
        "unavailable",
        "currentlyunavailable",
        "temporarilyunavailable",
        "notinstock",
        "preorder",
        "backorder",
    ];
    const IS_TOKENS: &[&str] = &["instock", "limitedavailability", "availablefororder"];

    if OOS_TOKENS.iter().any(|t| token == *t) {
        let mut signal = BestSignal::default();
        signal.offer(94, format!("structured:{token}"), source);
        evidence.best_out.offer(94, format!("structured:{token}"), source);
        evidence.note(format!("structured-oos:{token}"));
        merge_structured(&mut evidence.structured_out, signal);
    } else if IS_TOKENS.iter().any(|t| token == *t) {
        let mut signal = BestSignal::default();
        signal.offer(90, format!("structured:{token}"), source);
        evidence.best_in.offer(90, format!("structured:{token}"), source);
        evidence.note(format!("structured-is:{token}"));
        merge_structured(&mut evidence.structured_in, signal);
    }
}

fn merge_structured(slot: &mut Option<BestSignal>, candidate: BestSignal) {
    match slot {
        Some(existing) if existing.score >= candidate.score => {}
        _ => *slot = Some(candidate),
    }
}

fn collect_textual_selectors(document: &Html, evidence: &mut Evidence) {
    for sel in TEXTUAL_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else { continue };
        for el in document.select(&selector) {
            if !is_visible(el) {
                continue;
            }
            let text = el.text().collect::<String>();
            if let Some(m) = fuzzy_match(&text) {
                let score = m.base_score.saturating_add(textual_selector_bonus(sel));
                if m.is_oos {
                    evidence.best_out.offer(score, "textual-selector", sel.to_string());
                } else {
                    evidence.best_in.offer(score, "textual-selector", sel.to_string());
                }
                evidence.note(format!("textual:{sel}"));
            }
        }
    }
}

/// Selectors that are specifically an availability/stock signal (not a
/// generic substring match on `class`/`id`) score a bonus over them.
fn textual_selector_bonus(sel: &str) -> u8 {
    match sel {
        "#availability" | "#availabilityInsideBuyBox_feature_div" | "#outOfStock" | "[itemprop=\"availability\"]" => 8,
        _ => 0,
    }
}

fn collect_action_elements(document: &Html, evidence: &mut Evidence, is_amazon: bool) {
    const SELECTORS: &[&str] = &["button", "input[type=submit]", "a[role=button]"];
    let mut scanned = 0usize;

    for sel in SELECTORS {
        let Ok(selector) = Selector::parse(sel) else { continue };
        for el in document.select(&selector) {
            if scanned >= 160 {
                return;
            }
            scanned += 1;
            if !is_visible(el) {
                continue;
            }

            let label = el
                .value()
                .attr("aria-label")
                .or_else(|| el.value().attr("value"))
                .map(str::to_string)
                .unwrap_or_else(|| el.text().collect::<String>());
            let attrs = [
                el.value().attr("id").unwrap_or(""),
                el.value().attr("name").unwrap_or(""),
                el.value().attr("class").unwrap_or(""),
                el.value().attr("data-testid").unwrap_or(""),
                el.value().attr("data-test-id").unwrap_or(""),
            ]
            .join(" ");
            let blob = normalize(&format!("{label} {attrs}"));

            let is_disabled = el.value().attr("disabled").is_some();

            if is_amazon
                && PURCHASE_ACTION_TOKENS.iter().any(|t| blob.contains(t))
                && MODIFIER_WORDS.iter().any(|m| blob.contains(m))
            {
                continue; // Amazon keyboard-shortcut label, not a real purchase control.
            }

            if PURCHASE_ACTION_TOKENS.iter().any(|t| blob.contains(t)) {
                if is_disabled {
                    evidence.has_disabled_purchase_action = true;
                    evidence.best_out.offer(80, "purchase-action-disabled", "action-element");
                } else {
                    evidence.has_enabled_purchase_action = true;
                    evidence.best_in.offer(78, "purchase-action", "action-element");
                }
                evidence.note("purchase-action");
            }
            if BUYING_OPTIONS_TOKENS.iter().any(|t| blob.contains(t)) {
                evidence.has_buying_options_action = true;
                evidence.best_out.offer(68, "buying-options-action", "action-element");
                evidence.note("buying-options-action");
            }
            if NOTIFY_ME_TOKENS.iter().any(|t| blob.contains(t)) {
                evidence.best_out.offer(74, "notify-me-action", "action-element");
                evidence.note("notify-me-action");
            }
            if VARIANT_PROMPT_TOKENS.iter().any(|t| blob.contains(t)) {
                evidence.requires_variant_selection = true;
                evidence.note("variant-selection-prompt");
            }
        }
    }
}

fn collect_variant_structure(document: &Html, evidence: &mut Evidence) {
    let Ok(selector) = Selector::parse("select") else { return };
    for el in document.select(&selector) {
        let option_count = el.children().filter(|c| c.value().as_element().map(|e| e.name() == "option").unwrap_or(false)).count();
        let attrs = [
            el.value().attr("id").unwrap_or(""),
            el.value().attr("name").unwrap_or(""),
            el.value().attr("class").unwrap_or(""),
        ]
        .join(" ")
        .to_ascii_lowercase();

        if option_count > 1 || VARIANT_ATTR_TOKENS.iter().any(|t| attrs.contains(t)) {
            evidence.has_variant_selectors = true;
            evidence.note("variant-select-structure");
        }
    }
}

fn collect_amazon_structures(document: &Html, evidence: &mut Evidence) {
    if let Ok(selector) = Selector::parse("[id^=\"unqualifiedBuyBox\"]") {
        if document.select(&selector).next().is_some() {
            evidence.best_out.offer(88, "unqualified-buy-box", "amazon-structure");
            evidence.has_buying_options_action = true;
            evidence.note("amazon-unqualified-buybox");
        }
    }

    const OFFER_LISTING_SELECTORS: &[&str] = &[
        "#buybox-see-all-buying-choices",
        "[data-action=\"show-all-offers-display\"]",
        "#all-offers-display",
        "#aod-has-oas-offers",
        "a[href*=\"/gp/offer-listing/\"]",
        "a[href*=\"ref=dp_olp\"]",
    ];
    for sel in OFFER_LISTING_SELECTORS {
        if let Ok(selector) = Selector::parse(sel) {
            if document.select(&selector).next().is_some() {
                evidence.best_out.offer(72, "offer-listing-page", "amazon-structure");
                evidence.note(format!("amazon-offer-listing:{sel}"));
            }
        }
    }
}

/// Hidden via attribute, common utility classes, or an explicit inline
/// style that removes the element from the rendered page.
fn is_visible(el: ElementRef) -> bool {
    if el.value().attr("hidden").is_some() {
        return false;
    }
    if el.value().attr("aria-hidden") == Some("true") {
        return false;
    }
    if let Some(class) = el.value().attr("class") {
        let classes: Vec<&str> = class.split_whitespace().collect();
        if classes
            .iter()
            .any(|c| matches!(*c, "hidden" | "d-none" | "sr-only" | "visually-hidden"))
        {
            return false;
        }
    }
    if let Some(style) = el.value().attr("style") {
        let s = style.to_ascii_lowercase().replace(' ', "");
        if s.contains("display:none") || s.contains("visibility:hidden") || s.contains("opacity:0") {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_oos_meta_is_detected() {
        let html = r#"<html><head><meta itemprop="availability" content="http://schema.org/OutOfStock"></head></html>"#;
        let document = Html::parse_document(html);
        let evidence = collect(&document, html, "example.com");
        assert_eq!(evidence.best_out.score, 94);
        assert!(evidence.structured_out.is_some());
    }

    #[test]
    fn enabled_add_to_cart_sets_purchase_signal() {
        let html = r#"<html><body><button id="add-to-cart">Add to Cart</button></body></html>"#;
        let document = Html::parse_document(html);
        let evidence = collect(&document, html, "example.com");
        assert!(evidence.has_enabled_purchase_action);
        assert_eq!(evidence.best_in.score, 78);
    }

    #[test]
    fn disabled_purchase_button_flags_disabled_not_enabled() {
        let html = r#"<html><body><button disabled>Add to Cart</button></body></html>"#;
        let document = Html::parse_document(html);
        let evidence = collect(&document, html, "example.com");
        assert!(evidence.has_disabled_purchase_action);
        assert!(!evidence.has_enabled_purchase_action);
    }

    #[test]
    fn hidden_textual_selector_is_skipped() {
        let html = r#"<html><body><div id="availability" style="display: none">Sold Out</div></body></html>"#;
        let document = Html::parse_document(html);
        let evidence = collect(&document, html, "example.com");
        assert_eq!(evidence.best_out.score, 0);
    }

    #[test]
    fn amazon_unqualified_buybox_sets_buying_options_flag() {
        let html = r#"<html><body><div id="unqualifiedBuyBox">x</div></body></html>"#;
        let document = Html::parse_document(html);
        let evidence = collect(&document, html, "www.amazon.com");
        assert!(evidence.has_buying_options_action);
        assert_eq!(evidence.best_out.score, 88);
    }
}
