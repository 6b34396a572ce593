//! Applies every cumulative scoring adjustment to a freshly collected
//! candidate pool, before dedup and ranking.

use super::candidate::{
    numeric_signal_delta, selector_signal_delta, text_signal_delta, Candidate,
};

pub fn apply_adjustments(candidates: &mut [Candidate], preferred_currency: &str) {
    for c in candidates.iter_mut() {
        let delta = text_signal_delta(&c.snippet)
            + selector_signal_delta(&c.selector)
            + numeric_signal_delta(c.price, &c.currency, preferred_currency, c.source);
        c.score += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::candidate::Source;

    #[test]
    fn price_labeled_selector_outranks_unlabeled_after_adjustment() {
        let mut candidates = vec![
            Candidate {
                price: 19.99,
                currency: "USD".into(),
                selector: ".price-current".into(),
                source: Source::Selector,
                score: Source::Selector.base_score(),
                snippet: "Sale price $19.99".into(),
            },
            Candidate {
                price: 29.99,
                currency: "USD".into(),
                selector: ".price-old".into(),
                source: Source::Selector,
                score: Source::Selector.base_score(),
                snippet: "was $29.99".into(),
            },
        ];
        apply_adjustments(&mut candidates, "USD");
        assert!(candidates[0].score > candidates[1].score);
    }
}
