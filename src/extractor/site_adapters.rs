//! Site adapters: `(host pattern, selector list)` pairs giving
//! high-precision selectors for known storefronts, plus the generic base
//! list every host gets and the Amazon-only allowlist used by the final
//! gate.

pub fn is_amazon_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h.contains("amazon.")
}

/// Selectors specific to a known retailer, or an empty list for unknown
/// hosts.
pub fn adapter_selectors(host: &str) -> &'static [&'static str] {
    let h = host.to_ascii_lowercase();

    if is_amazon_host(&h) {
        return &[
            "#corePrice_feature_div .a-price .a-offscreen",
            "#corePriceDisplay_desktop_feature_div .a-price .a-offscreen",
            "#priceblock_ourprice",
            "#priceblock_dealprice",
            "#price_inside_buybox",
            "#apex_desktop .a-price .a-offscreen",
            "#twister-plus-price-data-price",
        ];
    }
    if h.contains("trendyol.com") {
        return &[".prc-dsc", ".product-price-container .prc-dsc"];
    }
    if h.contains("hepsiburada.com") {
        return &["[data-test-id=\"price-current-price\"]"];
    }
    &[]
}

/// Selectors every host gets regardless of adapter match.
pub const GENERIC_BASE_SELECTORS: &[&str] = &[
    "meta[itemprop=price]",
    "meta[property=\"og:price:amount\"]",
    "meta[property=\"product:price:amount\"]",
    "[itemprop=\"price\"]",
    "[class*=\"price\"]",
    "[id*=\"price\"]",
    ".a-price .a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
];

/// Selectors allowed to survive the Amazon price-gate, checked against a
/// candidate's `selector` string with a prefix/substring match.
pub const AMAZON_GATE_ALLOWED_PREFIXES: &[&str] = &[
    "#corePrice",
    "#priceblock_",
    "#price_inside_buybox",
    "#apex_",
    "twister-plus-price-data-price",
];

pub fn passes_amazon_gate_selector(selector: &str) -> bool {
    if is_meta_price_selector(selector) {
        return true;
    }
    AMAZON_GATE_ALLOWED_PREFIXES.iter().any(|p| selector.contains(p))
}

fn is_meta_price_selector(selector: &str) -> bool {
    selector.contains("meta[itemprop=price]")
        || selector.contains("og:price:amount")
        || selector.contains("product:price:amount")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amazon_host_detected_across_cctlds() {
        assert!(is_amazon_host("www.amazon.com"));
        assert!(is_amazon_host("www.amazon.co.uk"));
        assert!(!is_amazon_host("www.example.com"));
    }

    #[test]
    fn adapter_selectors_known_retailer() {
        assert!(!adapter_selectors("www.amazon.com").is_empty());
        assert!(!adapter_selectors("www.trendyol.com").is_empty());
        assert!(adapter_selectors("www.unknownstore.example").is_empty());
    }

    #[test]
    fn amazon_gate_allows_core_price_and_meta_only() {
        assert!(passes_amazon_gate_selector("#corePrice_feature_div .a-price .a-offscreen"));
        assert!(passes_amazon_gate_selector("meta[itemprop=price]"));
        assert!(!passes_amazon_gate_selector(".price"));
        assert!(!passes_amazon_gate_selector("[class*=\"price\"]"));
    }
}
