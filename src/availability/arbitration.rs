//! Ten-rule arbitration: first match wins. Operates purely on accumulated
//! [`Evidence`], so it's testable without a DOM in front of it.

use crate::models::StockStatus;

use super::aggregate::Evidence;

pub struct Verdict {
    pub status: StockStatus,
    pub confidence: u8,
    pub reason: String,
    pub source: String,
}

pub fn arbitrate(evidence: &Evidence, host: &str) -> Verdict {
    let is_amazon = crate::extractor::site_adapters::is_amazon_host(host);
    let best_out = evidence.best_out.score;
    let best_in = evidence.best_in.score;

    // 1. Disabled-purchase-because-variant-required reads as in-stock.
    if (evidence.requires_variant_selection || evidence.has_variant_selectors)
        && evidence.has_disabled_purchase_action
        && !evidence.has_enabled_purchase_action
        && best_out < 92
        && !matches!(&evidence.structured_out, Some(s) if s.score >= 94)
    {
        return Verdict {
            status: StockStatus::InStock,
            confidence: best_in.max(72),
            reason: "disabled purchase action pending variant selection".into(),
            source: "variant-gate".into(),
        };
    }

    // 2. Structured OOS wins unless structured IS is present and not
    // clearly weaker (oos.score must be at least is.score + 2 to hold).
    if let Some(oos) = &evidence.structured_out {
        let oos_holds = match &evidence.structured_in {
            None => true,
            Some(is) => oos.score >= is.score.saturating_add(2),
        };
        if oos_holds {
            return Verdict {
                status: StockStatus::OutOfStock,
                confidence: oos.score,
                reason: oos.reason.clone(),
                source: oos.source.clone(),
            };
        }
    }

    // 3. Structured IS only.
    if evidence.structured_out.is_none() {
        if let Some(is) = &evidence.structured_in {
            return Verdict {
                status: StockStatus::InStock,
                confidence: is.score,
                reason: is.reason.clone(),
                source: is.source.clone(),
            };
        }
    }

    // 4. Enabled purchase action, no disabled one, low bestOut.
    if evidence.has_enabled_purchase_action && !evidence.has_disabled_purchase_action && best_out < 88 {
        return Verdict {
            status: StockStatus::InStock,
            confidence: best_in.max(74),
            reason: "enabled purchase action".into(),
            source: "purchase-action".into(),
        };
    }

    // 5. Strong bestOut lead.
    if best_out >= 82 && best_out >= best_in + 10 {
        return Verdict {
            status: StockStatus::OutOfStock,
            confidence: best_out,
            reason: evidence.best_out.reason.clone(),
            source: evidence.best_out.source.clone(),
        };
    }

    // 6. Strong bestIn lead.
    if best_in >= 72 && best_in >= best_out + 6 {
        return Verdict {
            status: StockStatus::InStock,
            confidence: best_in,
            reason: evidence.best_in.reason.clone(),
            source: evidence.best_in.source.clone(),
        };
    }

    // 7. Disabled purchase action with moderate bestOut.
    if evidence.has_disabled_purchase_action && best_out >= 74 {
        return Verdict {
            status: StockStatus::OutOfStock,
            confidence: best_out,
            reason: "disabled purchase action".into(),
            source: "purchase-action-disabled".into(),
        };
    }

    // 8 & 9 are Amazon-only escalations, handled by the caller with access
    // to a compact text blob and the enabled-purchase-action flag; see
    // [`amazon_text_blob_escalation`] and [`amazon_offer_listing_escalation`].
    let _ = is_amazon;

    // 10. No decisive signal.
    Verdict {
        status: StockStatus::Unknown,
        confidence: best_in.max(best_out),
        reason: "no decisive signal".into(),
        source: "none".into(),
    }
}

/// Rule 8: Amazon-only strong-OOS phrase scan over a compact text blob
/// (`#availability`, `#outOfStock`, `<title>`, meta description).
pub fn amazon_text_blob_escalation(evidence: &Evidence, blob: &str) -> Option<Verdict> {
    let m = super::terms::fuzzy_match(blob)?;
    if !m.is_oos {
        return None;
    }
    Some(Verdict {
        status: StockStatus::OutOfStock,
        confidence: evidence.best_out.score.max(90),
        reason: "amazon strong oos phrase".into(),
        source: "amazon-text-blob".into(),
    })
}

/// Rule 9: Amazon-only, primary offer gone, only third-party listings
/// remain.
pub fn amazon_offer_listing_escalation(evidence: &Evidence) -> Option<Verdict> {
    if evidence.has_buying_options_action && !evidence.has_enabled_purchase_action && evidence.best_in.score < 78 {
        return Some(Verdict {
            status: StockStatus::OutOfStock,
            confidence: evidence.best_out.score.max(84),
            reason: "buying options only, no purchasable primary offer".into(),
            source: "amazon-offer-listing".into(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::super::aggregate::BestSignal;
    use super::*;

    fn evidence_with(best_out: u8, best_in: u8) -> Evidence {
        let mut e = Evidence::default();
        e.best_out.offer(best_out, "r", "s");
        e.best_in.offer(best_in, "r", "s");
        e
    }

    #[test]
    fn rule5_strong_out_lead_wins() {
        let e = evidence_with(85, 10);
        let v = arbitrate(&e, "example.com");
        assert_eq!(v.status, StockStatus::OutOfStock);
    }

    #[test]
    fn rule6_strong_in_lead_wins() {
        let e = evidence_with(20, 80);
        let v = arbitrate(&e, "example.com");
        assert_eq!(v.status, StockStatus::InStock);
    }

    #[test]
    fn rule10_fallback_to_unknown() {
        let e = evidence_with(10, 10);
        let v = arbitrate(&e, "example.com");
        assert_eq!(v.status, StockStatus::Unknown);
    }

    #[test]
    fn rule2_structured_oos_wins_over_weak_structured_is() {
        let mut e = Evidence::default();
        e.structured_out = Some(BestSignal {
            score: 94,
            reason: "structured:outofstock".into(),
            source: "meta-availability".into(),
        });
        e.structured_in = Some(BestSignal {
            score: 90,
            reason: "structured:instock".into(),
            source: "meta-availability".into(),
        });
        let v = arbitrate(&e, "example.com");
        assert_eq!(v.status, StockStatus::OutOfStock);
    }

    #[test]
    fn rule4_enabled_purchase_action_wins_in_stock() {
        let mut e = Evidence::default();
        e.has_enabled_purchase_action = true;
        let v = arbitrate(&e, "example.com");
        assert_eq!(v.status, StockStatus::InStock);
    }

    #[test]
    fn amazon_offer_listing_escalation_fires_when_only_third_party_remains() {
        let mut e = Evidence::default();
        e.has_buying_options_action = true;
        let v = amazon_offer_listing_escalation(&e).expect("escalation expected");
        assert_eq!(v.status, StockStatus::OutOfStock);
        assert!(v.confidence >= 84);
    }
}
