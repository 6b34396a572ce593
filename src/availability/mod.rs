//! Availability classifier: scores in-stock vs out-of-stock signals from
//! meta tags, JSON-LD, DOM selectors, and purchase/variant controls, then
//! arbitrates to a single verdict.

mod aggregate;
mod arbitration;
mod signals;
mod terms;

use scraper::{Html, Selector};
use serde::Serialize;

use crate::extractor::site_adapters::is_amazon_host;
use crate::models::StockStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub status: StockStatus,
    pub confidence: u8,
    pub reason: String,
    pub source: String,
    pub signals: Vec<String>,
}

pub fn classify(html: &str, url: &str) -> AvailabilityResult {
    let document = Html::parse_document(html);
    let host = crate::url_guard::extract_host(url);

    let evidence = signals::collect(&document, html, &host);
    let mut verdict = arbitration::arbitrate(&evidence, &host);

    // Rules 8/9 are Amazon-only escalations reached only when rules 1-7
    // left no decisive verdict (rule 10's Unknown fallback).
    if is_amazon_host(&host) && verdict.status == StockStatus::Unknown {
        let blob = amazon_text_blob(&document, html);
        if let Some(escalated) = arbitration::amazon_text_blob_escalation(&evidence, &blob) {
            verdict = escalated;
        } else if let Some(escalated) = arbitration::amazon_offer_listing_escalation(&evidence) {
            verdict = escalated;
        }
    }

    AvailabilityResult {
        status: verdict.status,
        confidence: verdict.confidence,
        reason: verdict.reason,
        source: verdict.source,
        signals: evidence.signals_fired,
    }
}

/// Compact text blob used by the Amazon-only strong-OOS phrase scan
/// (rule 8): `#availability`, `#outOfStock`, `<title>`, meta description.
fn amazon_text_blob(document: &Html, _html: &str) -> String {
    let mut parts = Vec::new();
    for sel in ["#availability", "#outOfStock", "title", "meta[name=description]"] {
        let Ok(selector) = Selector::parse(sel) else { continue };
        for el in document.select(&selector) {
            if let Some(content) = el.value().attr("content") {
                parts.push(content.to_string());
            } else {
                parts.push(el.text().collect::<String>());
            }
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shopify_style_in_stock_page() {
        let html = r#"<html><head>
            <meta itemprop="price" content="199.99">
        </head><body>
            <button id="add-to-cart">Add to Cart</button>
        </body></html>"#;
        let result = classify(html, "https://shop.example.com/product");
        assert_eq!(result.status, StockStatus::InStock);
    }

    #[test]
    fn amazon_listing_with_no_purchase_button_is_out_of_stock() {
        let html = r#"<html><body>
            <div id="unqualifiedBuyBox">See All Buying Options</div>
        </body></html>"#;
        let result = classify(html, "https://www.amazon.com/dp/B0TEST");
        assert_eq!(result.status, StockStatus::OutOfStock);
        assert!(result.confidence >= 84);
    }

    #[test]
    fn amazon_enabled_buy_button_wins_over_stale_oos_banner() {
        let html = r#"<html><body>
            <div id="availability">Temporarily out of stock</div>
            <button id="add-to-cart">Add to Cart</button>
        </body></html>"#;
        let result = classify(html, "https://www.amazon.com/dp/B0TEST");
        assert_eq!(result.status, StockStatus::InStock);
    }

    #[test]
    fn structured_oos_json_ld_wins() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"Product","offers":{"availability":"https://schema.org/OutOfStock"}}
        </script></head></html>"#;
        let result = classify(html, "https://shop.example.com/product");
        assert_eq!(result.status, StockStatus::OutOfStock);
        assert!(result.confidence >= 94);
    }
}
