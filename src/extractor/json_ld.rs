//! JSON-LD offer extraction: walk every `<script type="application/ld+json">`
//! block and pull `offers.price`/`priceCurrency` out of the parsed tree.

use scraper::{Html, Selector};
use serde_json::Value;

use super::candidate::{Candidate, Source};

/// All JSON-LD candidates found in `document`, score 95 each.
pub fn collect(document: &Html) -> Vec<Candidate> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    let mut candidates = Vec::new();

    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        walk(&value, &mut candidates);
    }

    candidates
}

fn walk(value: &Value, out: &mut Vec<Candidate>) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(offers) = map.get("offers") {
                collect_offers(offers, out);
            }
            for v in map.values() {
                walk(v, out);
            }
        }
        _ => {}
    }
}

fn collect_offers(offers: &Value, out: &mut Vec<Candidate>) {
    match offers {
        Value::Array(items) => {
            for item in items {
                collect_offers(item, out);
            }
        }
        Value::Object(map) => {
            let currency = map
                .get("priceCurrency")
                .and_then(Value::as_str)
                .unwrap_or("USD")
                .to_ascii_uppercase();

            for key in ["price", "lowPrice", "highPrice"] {
                if let Some(raw) = map.get(key) {
                    if let Some(price) = price_value(raw) {
                        out.push(Candidate {
                            price,
                            currency: currency.clone(),
                            selector: format!("json-ld offers.{key}"),
                            source: Source::JsonLd,
                            score: Source::JsonLd.base_score(),
                            snippet: raw.to_string(),
                        });
                    }
                }
            }

            // Nested offers (AggregateOffer wraps multiple Offer nodes).
            if let Some(nested) = map.get("offers") {
                collect_offers(nested, out);
            }
        }
        _ => {}
    }
}

fn price_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v > 0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn simple_offer_is_extracted() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"Product","offers":{"@type":"Offer","price":"199.99","priceCurrency":"USD"}}
        </script></head></html>"#;
        let candidates = collect(&doc(html));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 199.99);
        assert_eq!(candidates[0].currency, "USD");
        assert_eq!(candidates[0].score, 95);
    }

    #[test]
    fn aggregate_offer_array_yields_multiple_candidates() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"Product","offers":[
                {"@type":"Offer","price":10.0,"priceCurrency":"USD"},
                {"@type":"Offer","price":12.5,"priceCurrency":"USD"}
            ]}
        </script></head></html>"#;
        let candidates = collect(&doc(html));
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn malformed_json_is_skipped_not_fatal() {
        let html = r#"<html><head><script type="application/ld+json">{not json</script></head></html>"#;
        assert!(collect(&doc(html)).is_empty());
    }

    #[test]
    fn missing_currency_defaults_to_usd() {
        let html = r#"<html><head><script type="application/ld+json">
            {"offers":{"price":5.0}}
        </script></head></html>"#;
        let candidates = collect(&doc(html));
        assert_eq!(candidates[0].currency, "USD");
    }
}
