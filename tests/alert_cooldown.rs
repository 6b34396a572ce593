//! End-to-end target-hit alert cooldown behavior: fires once, a second
//! fire within the cooldown window is suppressed, and a fire after the
//! cooldown elapses is allowed again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use stockwatch_engine::alerts::AlertEngine;
use stockwatch_engine::models::{AlertRules, Item, StockStatus};
use stockwatch_engine::notify::NotificationSink;

struct CountingSink(Arc<AtomicUsize>);

#[async_trait]
impl NotificationSink for CountingSink {
    async fn send(&self, _title: &str, _body: &str) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn target_hit_only_rules() -> AlertRules {
    AlertRules {
        target_hit_enabled: true,
        price_drop_enabled: false,
        price_drop_24h_enabled: false,
        all_time_low_enabled: false,
        low_confidence_enabled: false,
        stale_enabled: false,
        ..AlertRules::default()
    }
}

#[tokio::test]
async fn target_hit_fires_once_suppresses_within_cooldown_then_fires_again_after() {
    let engine = AlertEngine::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let sinks: Vec<Box<dyn NotificationSink>> = vec![Box::new(CountingSink(calls.clone()))];
    let rules = target_hit_only_rules();

    let mut item = Item::new("https://shop.example.com/widget".into(), None, "Widget".into());
    item.target_price = Some(100.0);

    let t0 = Utc::now();

    // Crossing event 1: price was 110 (above target), scrape now returns 99 (at/below). Fires.
    item.current_price = Some(99.0);
    engine
        .evaluate_price_update(&item, Some(110.0), StockStatus::InStock, &rules, &sinks, t0)
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Crossing event 2, still within the cooldown window: price bounces back above
    // target (105) then crosses again (98). Suppressed by the cooldown.
    item.current_price = Some(98.0);
    let t1 = t0 + Duration::minutes((rules.notify_cooldown_minutes as i64) - 1);
    engine
        .evaluate_price_update(&item, Some(105.0), StockStatus::InStock, &rules, &sinks, t1)
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Crossing event 3, after the cooldown has elapsed. Fires again.
    item.current_price = Some(97.0);
    let t2 = t0 + Duration::minutes((rules.notify_cooldown_minutes as i64) + 1);
    engine
        .evaluate_price_update(&item, Some(105.0), StockStatus::InStock, &rules, &sinks, t2)
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
