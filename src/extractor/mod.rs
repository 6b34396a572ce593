//! HTML Extractor: `extract(html, selectorHint?, url) -> ExtractionResult`.
//!
//! Assembles a pool of candidates from five strategies, scores and
//! deduplicates them, applies the Amazon price gate, and folds in the
//! availability classifier's out-of-stock suppression.

pub mod candidate;
pub mod currency;
pub mod json_ld;
pub mod normalize;
pub mod raw_json;
pub mod scoring;
pub mod selectors;
pub mod site_adapters;
pub mod text_heuristic;

use scraper::Html;
use serde::Serialize;

use crate::availability::{self, AvailabilityResult};
use crate::url_guard::extract_host;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub price: f64,
    pub currency: String,
    pub selector: String,
    pub source: String,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub price: Option<f64>,
    pub currency: String,
    pub confidence: u8,
    pub selector_used: Option<String>,
    pub source: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub availability: AvailabilityResult,
}

pub fn extract(html: &str, selector_hint: Option<&str>, url: &str) -> ExtractionResult {
    let document = Html::parse_document(html);
    let host = extract_host(url);
    let is_amazon = site_adapters::is_amazon_host(&host);
    let preferred_currency = currency::preferred_currency(&host);

    let mut candidates = json_ld::collect(&document);
    if !is_amazon {
        candidates.extend(raw_json::collect(html, preferred_currency));
    }
    candidates.extend(selectors::collect_custom(&document, selector_hint, &host, preferred_currency));
    candidates.extend(selectors::collect_site_and_generic(&document, &host, preferred_currency));
    if !is_amazon {
        candidates.extend(text_heuristic::collect(&document, preferred_currency));
    }

    scoring::apply_adjustments(&mut candidates, preferred_currency);
    let mut candidates = candidate::dedup_candidates(candidates);

    if is_amazon {
        candidates.retain(|c| {
            site_adapters::passes_amazon_gate_selector(&c.selector) && c.currency == preferred_currency
        });
    }

    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    let suggestions: Vec<Suggestion> = candidates
        .iter()
        .take(5)
        .map(|c| Suggestion {
            price: c.price,
            currency: c.currency.clone(),
            selector: c.selector.clone(),
            source: c.source.as_str().to_string(),
            score: c.score,
        })
        .collect();

    let availability_result = availability::classify(html, url);

    let best = candidates.first();

    let suppressed = is_amazon && availability_result.status == crate::models::StockStatus::OutOfStock && availability_result.confidence >= 80;

    if suppressed {
        return ExtractionResult {
            price: None,
            currency: best.map(|c| c.currency.clone()).unwrap_or_else(|| preferred_currency.to_string()),
            confidence: availability_result.confidence,
            selector_used: best.map(|c| c.selector.clone()),
            source: best.map(|c| c.source.as_str().to_string()),
            suggestions,
            availability: availability_result,
        };
    }

    match best {
        Some(c) => ExtractionResult {
            price: Some(c.price),
            currency: c.currency.clone(),
            confidence: clamp_confidence(c.score),
            selector_used: Some(c.selector.clone()),
            source: Some(c.source.as_str().to_string()),
            suggestions,
            availability: availability_result,
        },
        None => ExtractionResult {
            price: None,
            currency: preferred_currency.to_string(),
            confidence: 0,
            selector_used: None,
            source: None,
            suggestions,
            availability: availability_result,
        },
    }
}

fn clamp_confidence(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shopify_html() -> &'static str {
        r#"<html><head>
            <meta itemprop="price" content="199.99">
            <meta itemprop="priceCurrency" content="USD">
        </head><body>
            <button id="add-to-cart">Add to Cart</button>
        </body></html>"#
    }

    #[test]
    fn s1_shopify_style_page() {
        let result = extract(shopify_html(), None, "https://shop.example.com/p/widget");
        assert_eq!(result.price, Some(199.99));
        assert_eq!(result.currency, "USD");
        assert_eq!(result.availability.status, crate::models::StockStatus::InStock);
        assert!(result.confidence >= 74);
    }

    #[test]
    fn s2_amazon_listing_ignores_installment_price() {
        let html = r#"<html><body>
            <div id="corePrice_feature_div"><span class="a-price"><span class="a-offscreen">$1,299.00</span></span></div>
            <div class="price">$17.99/mo</div>
            <button id="buy">Add to Cart</button>
        </body></html>"#;
        let result = extract(html, None, "https://www.amazon.com/dp/B0TEST");
        assert_eq!(result.price, Some(1299.00));
        assert!(result.selector_used.as_deref().unwrap_or("").contains("corePrice"));
    }

    #[test]
    fn s3_amazon_no_purchase_button_suppresses_price() {
        let html = r#"<html><body>
            <div id="corePrice_feature_div"><span class="a-price"><span class="a-offscreen">$1,299.00</span></span></div>
            <div id="unqualifiedBuyBox">See All Buying Options</div>
        </body></html>"#;
        let result = extract(html, None, "https://www.amazon.com/dp/B0TEST");
        assert_eq!(result.price, None);
        assert_eq!(result.availability.status, crate::models::StockStatus::OutOfStock);
        assert!(result.confidence >= 88);
    }

    #[test]
    fn s4_turkish_retailer_text_candidate() {
        let html = r#"<html><body><span class="prc-dsc">1.299,90 TL</span></body></html>"#;
        let result = extract(html, None, "https://www.trendyol.com/urun/123");
        assert_eq!(result.price, Some(1299.90));
        assert_eq!(result.currency, "TRY");
    }

    #[test]
    fn no_candidates_yields_none_price() {
        let html = r#"<html><body><p>Nothing to see here.</p></body></html>"#;
        let result = extract(html, None, "https://example.com/empty");
        assert_eq!(result.price, None);
    }

    #[test]
    fn selector_hint_wins_via_custom_probe() {
        let html = r#"<html><body><span id="special">Sale price $42.00</span></body></html>"#;
        let result = extract(html, Some("special"), "https://example.com/p");
        assert_eq!(result.price, Some(42.00));
        assert_eq!(result.source.as_deref(), Some("custom"));
    }
}
