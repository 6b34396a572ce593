//! Alert Engine: evaluates configurable rules against an item's state
//! transition and dispatches fired alerts to every notification sink,
//! subject to a per-`(rule, item)` cooldown.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::{AlertRules, Item, StockStatus};
use crate::notify::{self, NotificationSink};

pub struct AlertEngine {
    last_fired: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self {
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    fn try_claim(&self, rule: &str, item_id: &str, cooldown_minutes: u64, now: DateTime<Utc>) -> bool {
        let key = (rule.to_string(), item_id.to_string());
        let mut map = self.last_fired.lock();
        match map.get(&key) {
            Some(last) if now - *last < chrono::Duration::minutes(cooldown_minutes as i64) => false,
            _ => {
                map.insert(key, now);
                true
            }
        }
    }

    /// Evaluates every price/confidence/status rule after a successful
    /// check, against the item's state *before* the caller applies the
    /// new observation.
    pub async fn evaluate_price_update(
        &self,
        item: &Item,
        old_price: Option<f64>,
        old_status: StockStatus,
        rules: &AlertRules,
        sinks: &[Box<dyn NotificationSink>],
        now: DateTime<Utc>,
    ) {
        let Some(new_price) = item.current_price else {
            self.maybe_fire_out_of_stock(item, old_status, rules, sinks, now).await;
            return;
        };

        if rules.target_hit_enabled {
            if let (Some(target), Some(old)) = (item.target_price, old_price) {
                if new_price <= target && old > target && self.try_claim("target_hit", &item.id, rules.notify_cooldown_minutes, now) {
                    notify::dispatch(
                        sinks,
                        "Target price hit",
                        &format!("{} reached {:.2} {}", item.name, new_price, item.currency),
                    )
                    .await;
                }
            }
        }

        if rules.price_drop_enabled {
            if let Some(old) = old_price {
                if new_price < old && self.try_claim("price_drop", &item.id, rules.notify_cooldown_minutes, now) {
                    notify::dispatch(
                        sinks,
                        "Price dropped",
                        &format!("{} dropped from {:.2} to {:.2} {}", item.name, old, new_price, item.currency),
                    )
                    .await;
                }
            }
        }

        if rules.price_drop_24h_enabled {
            if let (Some(old), Some(reference)) = (old_price, closest_to_24h_ago(item, now)) {
                if reference.price > 0.0 {
                    let percent = (reference.price - new_price) / reference.price * 100.0;
                    if percent >= rules.price_drop_24h_percent
                        && new_price < old
                        && self.try_claim("price_drop_24h", &item.id, rules.notify_cooldown_minutes, now)
                    {
                        notify::dispatch(
                            sinks,
                            "Price drop over 24h",
                            &format!("{} down {:.1}% in 24h to {:.2} {}", item.name, percent, new_price, item.currency),
                        )
                        .await;
                    }
                }
            }
        }

        if rules.all_time_low_enabled {
            let floor = item
                .history
                .iter()
                .map(|h| h.price)
                .chain(old_price)
                .fold(f64::INFINITY, f64::min);
            if new_price < floor && self.try_claim("all_time_low", &item.id, rules.notify_cooldown_minutes, now) {
                notify::dispatch(
                    sinks,
                    "All-time low",
                    &format!("{} hit a new low: {:.2} {}", item.name, new_price, item.currency),
                )
                .await;
            }
        }

        if rules.low_confidence_enabled {
            let c = item.extraction_confidence;
            if c > 0 && c < rules.low_confidence_threshold && self.try_claim("low_confidence", &item.id, rules.notify_cooldown_minutes, now) {
                notify::dispatch(
                    sinks,
                    "Low-confidence extraction",
                    &format!("{} extracted at confidence {}", item.name, c),
                )
                .await;
            }
        }

        self.maybe_fire_out_of_stock(item, old_status, rules, sinks, now).await;
    }

    async fn maybe_fire_out_of_stock(
        &self,
        item: &Item,
        old_status: StockStatus,
        rules: &AlertRules,
        sinks: &[Box<dyn NotificationSink>],
        now: DateTime<Utc>,
    ) {
        if item.stock_status == StockStatus::OutOfStock
            && old_status != StockStatus::OutOfStock
            && self.try_claim("out_of_stock", &item.id, rules.notify_cooldown_minutes, now)
        {
            notify::dispatch(sinks, "Out of stock", &format!("{} is now out of stock", item.name)).await;
        }
    }

    /// Evaluated on a failed check instead of a successful one.
    pub async fn evaluate_on_fail(&self, item: &Item, rules: &AlertRules, sinks: &[Box<dyn NotificationSink>], now: DateTime<Utc>) {
        if !rules.stale_enabled {
            return;
        }
        let Some(last_checked) = item.last_checked else {
            return;
        };
        if now - last_checked > chrono::Duration::hours(rules.stale_hours as i64)
            && self.try_claim("stale", &item.id, rules.notify_cooldown_minutes, now)
        {
            notify::dispatch(sinks, "Stale item", &format!("{} hasn't updated successfully in a while", item.name)).await;
        }
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// History point closest in time to `now - 24h`.
fn closest_to_24h_ago(item: &Item, now: DateTime<Utc>) -> Option<crate::models::HistoryPoint> {
    let target = now - chrono::Duration::hours(24);
    item.history
        .iter()
        .min_by_key(|h| (h.date - target).num_seconds().abs())
        .copied()
}
