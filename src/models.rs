//! Core data model: tracked items, alert rules, settings, diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-stock / out-of-stock / unknown, as produced by the availability
/// classifier and stored on an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    Unknown,
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::Unknown
    }
}

/// Outcome of the most recent check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Fail,
}

/// One point in a product's price history. `history` is append-only and
/// strictly non-decreasing in `date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub price: f64,
}

/// A tracked product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,

    // Inputs, user-editable between sweeps.
    pub url: String,
    pub selector: Option<String>,
    pub target_price: Option<f64>,
    pub list_id: String,
    pub name: String,

    // Observed state.
    pub current_price: Option<f64>,
    pub currency: String,
    pub price_in_usd: Option<f64>,
    pub last_seen_price: Option<f64>,

    // Availability.
    pub stock_status: StockStatus,
    pub stock_confidence: u8,
    pub stock_reason: String,
    pub stock_source: String,

    // Extraction quality.
    pub extraction_confidence: u8,

    // Check outcome.
    pub last_checked: Option<DateTime<Utc>>,
    pub last_check_attempt: Option<DateTime<Utc>>,
    pub last_check_status: Option<CheckStatus>,
    pub last_check_error: Option<String>,

    pub history: Vec<HistoryPoint>,
}

impl Item {
    pub fn new(url: String, selector: Option<String>, name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            selector,
            target_price: None,
            list_id: "default".to_string(),
            name,
            current_price: None,
            currency: "USD".to_string(),
            price_in_usd: None,
            last_seen_price: None,
            stock_status: StockStatus::Unknown,
            stock_confidence: 0,
            stock_reason: String::new(),
            stock_source: String::new(),
            extraction_confidence: 0,
            last_checked: None,
            last_check_attempt: None,
            last_check_status: None,
            last_check_error: None,
            history: Vec::new(),
        }
    }

    /// Append a history point iff the price changed or 24h elapsed since the
    /// last point.
    pub fn maybe_append_history(&mut self, date: DateTime<Utc>, price: f64) {
        let should_append = match self.history.last() {
            None => true,
            Some(last) => price != last.price || (date - last.date) > chrono::Duration::hours(24),
        };
        if should_append {
            self.history.push(HistoryPoint { date, price });
        }
    }
}

/// Fields an edit API may mutate between sweeps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEdit {
    pub url: Option<String>,
    pub selector: Option<Option<String>>,
    pub target_price: Option<Option<f64>>,
    pub name: Option<String>,
    pub list_id: Option<String>,
}

impl ItemEdit {
    pub fn apply(self, item: &mut Item) {
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(selector) = self.selector {
            item.selector = selector;
        }
        if let Some(target_price) = self.target_price {
            item.target_price = target_price;
        }
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(list_id) = self.list_id {
            item.list_id = list_id;
        }
    }
}

/// Configurable alert rules, global across all items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRules {
    pub target_hit_enabled: bool,
    pub price_drop_enabled: bool,
    pub price_drop_24h_enabled: bool,
    pub price_drop_24h_percent: f64,
    pub all_time_low_enabled: bool,
    pub low_confidence_enabled: bool,
    pub low_confidence_threshold: u8,
    pub stale_enabled: bool,
    pub stale_hours: u64,
    pub notify_cooldown_minutes: u64,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            target_hit_enabled: true,
            price_drop_enabled: true,
            price_drop_24h_enabled: true,
            price_drop_24h_percent: 5.0,
            all_time_low_enabled: true,
            low_confidence_enabled: true,
            low_confidence_threshold: 55,
            stale_enabled: true,
            stale_hours: 12,
            notify_cooldown_minutes: 240,
        }
    }
}

/// A grouping tag for the UI's list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemList {
    pub id: String,
    pub name: String,
}

/// Global settings, the other half of the state store's blob pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub discord_webhook: Option<String>,
    pub telegram_webhook: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub lists: Vec<ItemList>,
    pub alert_rules: AlertRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discord_webhook: None,
            telegram_webhook: None,
            telegram_chat_id: None,
            lists: vec![ItemList {
                id: "default".to_string(),
                name: "Default".to_string(),
            }],
            alert_rules: AlertRules::default(),
        }
    }
}

/// One entry in the append-only diagnostics ring buffer, newest first,
/// capped at [`DIAGNOSTICS_CAP`].
pub const DIAGNOSTICS_CAP: usize = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub time: DateTime<Utc>,
    pub item_id: String,
    pub item_name: String,
    pub url: String,
    pub list_id: String,
    pub ok: bool,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub confidence: Option<u8>,
    pub source: Option<String>,
    pub selector_used: Option<String>,
    pub stock_status: Option<StockStatus>,
    pub out_of_stock: bool,
    pub stock_reason: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_not_appended_when_price_unchanged_within_24h() {
        let mut item = Item::new("https://example.com".into(), None, "Widget".into());
        let t0 = Utc::now();
        item.maybe_append_history(t0, 10.0);
        item.maybe_append_history(t0 + chrono::Duration::hours(1), 10.0);
        assert_eq!(item.history.len(), 1);
    }

    #[test]
    fn history_appended_when_price_changes() {
        let mut item = Item::new("https://example.com".into(), None, "Widget".into());
        let t0 = Utc::now();
        item.maybe_append_history(t0, 10.0);
        item.maybe_append_history(t0 + chrono::Duration::hours(1), 9.0);
        assert_eq!(item.history.len(), 2);
    }

    #[test]
    fn history_appended_after_24h_even_at_same_price() {
        let mut item = Item::new("https://example.com".into(), None, "Widget".into());
        let t0 = Utc::now();
        item.maybe_append_history(t0, 10.0);
        item.maybe_append_history(t0 + chrono::Duration::hours(25), 10.0);
        assert_eq!(item.history.len(), 2);
    }

    #[test]
    fn default_alert_rules_are_sane() {
        let rules = AlertRules::default();
        assert_eq!(rules.price_drop_24h_percent, 5.0);
        assert_eq!(rules.low_confidence_threshold, 55);
        assert_eq!(rules.stale_hours, 12);
        assert_eq!(rules.notify_cooldown_minutes, 240);
    }
}
