//! Scheduler: sweeps every tracked item on a timer, fetching, extracting,
//! and updating state one item at a time with a short pacing delay
//! between items.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{error, warn};

use crate::alerts::AlertEngine;
use crate::browser_pool::BrowserPool;
use crate::extractor;
use crate::fx::FxTable;
use crate::models::{CheckStatus, DiagnosticEntry, Item, Settings, StockStatus, DIAGNOSTICS_CAP};
use crate::notify::{desktop::DesktopSink, telegram::TelegramSink, webhook::WebhookSink, NotificationSink};
use crate::state_store::StateStore;
use crate::url_guard;

pub struct SchedulerBusy;

pub struct Scheduler {
    store: Arc<dyn StateStore>,
    browser_pool: Arc<BrowserPool>,
    fx: Arc<FxTable>,
    alerts: Arc<AlertEngine>,

    items: Mutex<Vec<Item>>,
    settings: Mutex<Settings>,
    diagnostics: Mutex<VecDeque<DiagnosticEntry>>,

    sweeping: AtomicBool,
    currently_sweeping_item_id: RwLock<Option<String>>,

    allowed_hosts: Vec<String>,
    webhook_proxy_base: Option<String>,
    pacing_delay: Duration,
    periodic_interval: Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn StateStore>,
        browser_pool: Arc<BrowserPool>,
        fx: Arc<FxTable>,
        alerts: Arc<AlertEngine>,
        items: Vec<Item>,
        settings: Settings,
        diagnostics: VecDeque<DiagnosticEntry>,
        allowed_hosts: Vec<String>,
        webhook_proxy_base: Option<String>,
        pacing_delay: Duration,
        periodic_interval: Duration,
    ) -> Self {
        Self {
            store,
            browser_pool,
            fx,
            alerts,
            items: Mutex::new(items),
            settings: Mutex::new(settings),
            diagnostics: Mutex::new(diagnostics),
            sweeping: AtomicBool::new(false),
            currently_sweeping_item_id: RwLock::new(None),
            allowed_hosts,
            webhook_proxy_base,
            pacing_delay,
            periodic_interval,
        }
    }

    pub fn snapshot_items(&self) -> Vec<Item> {
        self.items.lock().clone()
    }

    pub fn snapshot_diagnostics(&self) -> Vec<DiagnosticEntry> {
        self.diagnostics.lock().iter().cloned().collect()
    }

    pub fn current_sweeping_item_id(&self) -> Option<String> {
        self.currently_sweeping_item_id.read().clone()
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::SeqCst)
    }

    pub fn apply_edit(&self, item_id: &str, edit: crate::models::ItemEdit) -> bool {
        let mut items = self.items.lock();
        match items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                edit.apply(item);
                true
            }
            None => false,
        }
    }

    pub fn replace_alert_rules(&self, rules: crate::models::AlertRules) {
        let mut settings = self.settings.lock();
        settings.alert_rules = rules;
        let _ = self.store.save_settings(&settings);
    }

    fn build_sinks(&self) -> Vec<Box<dyn NotificationSink>> {
        let settings = self.settings.lock();
        let mut sinks: Vec<Box<dyn NotificationSink>> = vec![Box::new(DesktopSink)];
        if let Some(url) = &settings.discord_webhook {
            sinks.push(Box::new(WebhookSink::new(url.clone(), self.webhook_proxy_base.as_deref())));
        }
        if let (Some(bot_url), Some(chat_id)) = (&settings.telegram_webhook, &settings.telegram_chat_id) {
            sinks.push(Box::new(TelegramSink::new(bot_url.clone(), chat_id.clone())));
        }
        sinks
    }

    /// Returns `Err(SchedulerBusy)` without doing anything if a sweep is
    /// already in progress.
    pub async fn trigger_manual(self: &Arc<Self>) -> Result<(), SchedulerBusy> {
        self.tick().await
    }

    pub fn spawn_periodic(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.periodic_interval);
            loop {
                interval.tick().await;
                let _ = self.tick().await;
            }
        })
    }

    /// One full sweep: iterate items in insertion order, check each,
    /// pace between them. Returns `Err(SchedulerBusy)` if re-entrant.
    pub async fn tick(self: &Arc<Self>) -> Result<(), SchedulerBusy> {
        if self.sweeping.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return Err(SchedulerBusy);
        }

        let item_ids: Vec<String> = self.items.lock().iter().map(|i| i.id.clone()).collect();
        let allowed_hosts = self.allowed_hosts.clone();

        for (idx, item_id) in item_ids.iter().enumerate() {
            *self.currently_sweeping_item_id.write() = Some(item_id.clone());

            self.check_one(item_id, &allowed_hosts).await;

            if idx + 1 < item_ids.len() {
                tokio::time::sleep(self.pacing_delay).await;
            }
        }

        *self.currently_sweeping_item_id.write() = None;
        self.sweeping.store(false, Ordering::SeqCst);

        let items_snapshot = self.items.lock().clone();
        if let Err(err) = self.store.save_items(&items_snapshot) {
            error!(error = %err, "failed to persist items after sweep");
        }
        let diagnostics_snapshot: VecDeque<DiagnosticEntry> = self.diagnostics.lock().clone();
        if let Err(err) = self.store.save_diagnostics(&diagnostics_snapshot) {
            error!(error = %err, "failed to persist diagnostics after sweep");
        }

        Ok(())
    }

    async fn check_one(self: &Arc<Self>, item_id: &str, allowed_hosts: &[String]) {
        let (url, selector, before) = {
            let items = self.items.lock();
            let Some(item) = items.iter().find(|i| i.id == item_id) else {
                return;
            };
            (item.url.clone(), item.selector.clone(), item.clone())
        };

        let now = Utc::now();
        let outcome = self.fetch_and_extract(&url, selector.as_deref(), allowed_hosts).await;

        match outcome {
            Ok(result) => self.apply_ok(item_id, &before, result, now).await,
            Err(err) => self.apply_fail(item_id, &before, err.to_string(), now).await,
        }
    }

    async fn fetch_and_extract(
        &self,
        url: &str,
        selector: Option<&str>,
        allowed_hosts: &[String],
    ) -> anyhow::Result<extractor::ExtractionResult> {
        url_guard::validate(url, allowed_hosts).await?;
        let html = self.browser_pool.fetch(url).await?;
        Ok(extractor::extract(&html, selector, url))
    }

    async fn apply_ok(
        self: &Arc<Self>,
        item_id: &str,
        before: &Item,
        result: extractor::ExtractionResult,
        now: chrono::DateTime<Utc>,
    ) {
        let old_price = before.current_price;
        let old_status = before.stock_status;

        let diagnostic = DiagnosticEntry {
            time: now,
            item_id: item_id.to_string(),
            item_name: before.name.clone(),
            url: before.url.clone(),
            list_id: before.list_id.clone(),
            ok: true,
            price: result.price,
            currency: Some(result.currency.clone()),
            confidence: Some(result.confidence),
            source: result.source.clone(),
            selector_used: result.selector_used.clone(),
            stock_status: Some(result.availability.status),
            out_of_stock: result.availability.status == StockStatus::OutOfStock,
            stock_reason: Some(result.availability.reason.clone()),
            error: None,
        };

        let price_changed = result.price.is_some()
            && result.price != old_price
            && result.availability.status != StockStatus::OutOfStock;

        // Evaluate alerts against the pre-update history: currentPrice and
        // the history point are applied only after alerts have fired, so
        // rules like all-time-low compare the new price against the floor
        // it would actually be breaking, not a floor that already includes it.
        let pre_history_item = {
            let mut items = self.items.lock();
            let Some(item) = items.iter_mut().find(|i| i.id == item_id) else {
                return;
            };

            item.currency = result.currency.clone();
            item.price_in_usd = result.price.and_then(|p| self.fx.to_usd(p, &result.currency));
            item.extraction_confidence = result.confidence;
            item.stock_status = result.availability.status;
            item.stock_confidence = result.availability.confidence;
            item.stock_reason = result.availability.reason.clone();
            item.stock_source = result.availability.source.clone();
            item.last_checked = Some(now);
            item.last_check_attempt = Some(now);
            item.last_check_status = Some(CheckStatus::Ok);
            item.last_check_error = None;

            match result.price {
                Some(price) if result.availability.status == StockStatus::OutOfStock => {
                    item.last_seen_price = Some(price);
                }
                Some(price) => {
                    if Some(price) != old_price {
                        item.current_price = Some(price);
                        item.last_seen_price = Some(price);
                    }
                }
                None => {}
            }

            item.clone()
        };

        self.push_diagnostic(diagnostic);

        let sinks = self.build_sinks();
        let rules = self.settings.lock().alert_rules.clone();
        self.alerts
            .evaluate_price_update(&pre_history_item, old_price, old_status, &rules, &sinks, now)
            .await;

        if price_changed {
            if let Some(price) = result.price {
                let mut items = self.items.lock();
                if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
                    item.maybe_append_history(now, price);
                }
            }
        }
    }

    async fn apply_fail(self: &Arc<Self>, item_id: &str, before: &Item, error_message: String, now: chrono::DateTime<Utc>) {
        warn!(item_id, error = %error_message, "check failed");

        let updated_item = {
            let mut items = self.items.lock();
            let Some(item) = items.iter_mut().find(|i| i.id == item_id) else {
                return;
            };
            item.last_check_attempt = Some(now);
            item.last_check_status = Some(CheckStatus::Fail);
            item.last_check_error = Some(error_message.clone());
            item.clone()
        };

        self.push_diagnostic(DiagnosticEntry {
            time: now,
            item_id: item_id.to_string(),
            item_name: before.name.clone(),
            url: before.url.clone(),
            list_id: before.list_id.clone(),
            ok: false,
            price: None,
            currency: None,
            confidence: None,
            source: None,
            selector_used: None,
            stock_status: None,
            out_of_stock: false,
            stock_reason: None,
            error: Some(error_message),
        });

        let sinks = self.build_sinks();
        let rules = self.settings.lock().alert_rules.clone();
        self.alerts.evaluate_on_fail(&updated_item, &rules, &sinks, now).await;
    }

    fn push_diagnostic(&self, entry: DiagnosticEntry) {
        let mut diagnostics = self.diagnostics.lock();
        diagnostics.push_front(entry);
        while diagnostics.len() > DIAGNOSTICS_CAP {
            diagnostics.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use std::io;

    struct NullStore;
    impl StateStore for NullStore {
        fn load(&self) -> io::Result<crate::state_store::StateSnapshot> {
            Ok(crate::state_store::StateSnapshot {
                items: vec![],
                settings: Settings::default(),
                diagnostics: VecDeque::new(),
            })
        }
        fn save_items(&self, _: &[Item]) -> io::Result<()> {
            Ok(())
        }
        fn save_settings(&self, _: &Settings) -> io::Result<()> {
            Ok(())
        }
        fn save_diagnostics(&self, _: &VecDeque<DiagnosticEntry>) -> io::Result<()> {
            Ok(())
        }
    }

    fn scheduler() -> Arc<Scheduler> {
        Arc::new(Scheduler::new(
            Arc::new(NullStore),
            Arc::new(BrowserPool::new(None)),
            Arc::new(FxTable::default()),
            Arc::new(AlertEngine::new()),
            vec![],
            Settings::default(),
            VecDeque::new(),
            vec![],
            None,
            Duration::from_millis(1),
            Duration::from_secs(3600),
        ))
    }

    #[tokio::test]
    async fn empty_item_list_sweep_completes_immediately() {
        let sched = scheduler();
        assert!(sched.tick().await.is_ok());
        assert!(sched.current_sweeping_item_id().is_none());
    }

    #[tokio::test]
    async fn reentrant_tick_reports_busy() {
        let sched = scheduler();
        sched.sweeping.store(true, Ordering::SeqCst);
        assert!(sched.tick().await.is_err());
        sched.sweeping.store(false, Ordering::SeqCst);
    }

    #[test]
    fn diagnostics_ring_buffer_stays_capped() {
        let diagnostics: Mutex<VecDeque<DiagnosticEntry>> = Mutex::new(VecDeque::new());
        let entry = DiagnosticEntry {
            time: Utc::now(),
            item_id: "x".into(),
            item_name: "x".into(),
            url: "https://example.com".into(),
            list_id: "default".into(),
            ok: true,
            price: None,
            currency: None,
            confidence: None,
            source: None,
            selector_used: None,
            stock_status: None,
            out_of_stock: false,
            stock_reason: None,
            error: None,
        };
        for _ in 0..(DIAGNOSTICS_CAP + 10) {
            let mut d = diagnostics.lock();
            d.push_front(entry.clone());
            while d.len() > DIAGNOSTICS_CAP {
                d.pop_back();
            }
        }
        assert_eq!(diagnostics.lock().len(), DIAGNOSTICS_CAP);
    }
}
