//! Raw-JSON regex scan: cheap signal for pages that embed price data in an
//! inline `<script>` blob that isn't valid JSON-LD (a GTM dataLayer push, a
//! hydration payload, etc). Skipped entirely for Amazon-family hosts, which
//! embed enough noisy `"price"` fields to make this actively misleading.

use once_cell::sync::Lazy;
use regex::Regex;

use super::candidate::{Candidate, Source};

static PRICE_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""priceAmount"\s*:\s*"([0-9.,]+)""#).unwrap());

static PRICE_WITH_CURRENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""price"\s*:\s*"([0-9.,]+)"[\s\S]{0,200}?"priceCurrency"\s*:\s*"([A-Za-z]{3})""#).unwrap()
});

/// Candidates from both raw-JSON patterns. Caller is responsible for
/// skipping this source on Amazon hosts.
pub fn collect(html: &str, preferred_currency: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for caps in PRICE_AMOUNT_RE.captures_iter(html) {
        if let Some(price) = super::normalize::normalize_number(&caps[1], preferred_currency) {
            candidates.push(Candidate {
                price,
                currency: preferred_currency.to_string(),
                selector: "raw-json priceAmount".to_string(),
                source: Source::RawJson,
                score: 88,
                snippet: caps[0].to_string(),
            });
        }
    }

    for caps in PRICE_WITH_CURRENCY_RE.captures_iter(html) {
        let currency = caps[2].to_ascii_uppercase();
        if let Some(price) = super::normalize::normalize_number(&caps[1], preferred_currency) {
            candidates.push(Candidate {
                price,
                currency,
                selector: "raw-json price+priceCurrency".to_string(),
                source: Source::RawJson,
                score: 90,
                snippet: caps[0].to_string(),
            });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_amount_pattern_scores_88() {
        let html = r#"{"priceAmount":"49.99","other":1}"#;
        let candidates = collect(html, "USD");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 49.99);
        assert_eq!(candidates[0].score, 88);
    }

    #[test]
    fn price_with_currency_within_200_chars_scores_90() {
        let html = r#"{"price":"19.99","priceCurrency":"USD"}"#;
        let candidates = collect(html, "USD");
        assert_eq!(candidates.iter().any(|c| c.score == 90), true);
    }

    #[test]
    fn price_with_currency_far_apart_is_not_matched() {
        let gap = "x".repeat(250);
        let html = format!(r#"{{"price":"19.99",{gap}"priceCurrency":"USD"}}"#);
        let candidates = collect(&html, "USD");
        assert!(candidates.iter().all(|c| c.selector != "raw-json price+priceCurrency"));
    }

    #[test]
    fn no_match_yields_no_candidates() {
        assert!(collect("no json here", "USD").is_empty());
    }
}
