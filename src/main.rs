//! stockwatch-engine — price & availability tracker.
//!
//! Loads persisted state, launches the browser pool, FX table, and
//! scheduler, and serves the control-surface API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_engine::alerts::AlertEngine;
use stockwatch_engine::api;
use stockwatch_engine::browser_pool::BrowserPool;
use stockwatch_engine::config::Config;
use stockwatch_engine::fx::FxTable;
use stockwatch_engine::middleware;
use stockwatch_engine::scheduler::Scheduler;
use stockwatch_engine::state_store::{FileStateStore, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    std::fs::create_dir_all(&config.state_dir).context("creating state directory")?;

    let store: Arc<dyn StateStore> = Arc::new(FileStateStore::new(&config.state_dir));
    let snapshot = store.load().context("loading persisted state")?;
    let mut settings = snapshot.settings;

    if settings.discord_webhook.is_none() {
        settings.discord_webhook = config.discord_webhook.clone();
    }
    if let (None, Some(host), Some(token)) = (
        &settings.telegram_webhook,
        &config.telegram_webhook_host,
        &config.telegram_bot_token,
    ) {
        settings.telegram_webhook = Some(format!("https://{host}/bot{token}/sendMessage"));
    }
    if settings.telegram_chat_id.is_none() {
        settings.telegram_chat_id = config.telegram_chat_id.clone();
    }

    let browser_pool = Arc::new(BrowserPool::new(config.browser_executable_path.clone()));
    let fx = Arc::new(FxTable::default());
    let alerts = Arc::new(AlertEngine::new());

    let scheduler = Arc::new(Scheduler::new(
        store,
        browser_pool,
        fx.clone(),
        alerts,
        snapshot.items,
        settings,
        snapshot.diagnostics,
        config.fetch_allowed_hosts.clone(),
        config.webhook_proxy_base.clone(),
        Duration::from_millis(config.item_pacing_ms),
        Duration::from_secs(config.sweep_interval_minutes * 60),
    ));

    fx.spawn_refresh_task(Duration::from_secs(config.fx_refresh_interval_minutes * 60));
    scheduler.clone().spawn_periodic();

    let app = api::router(scheduler)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_simple));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await.context("binding listener")?;
    info!(addr, "stockwatch-engine listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
