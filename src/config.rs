//! Runtime configuration, loaded from the environment.

use std::env;

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub state_dir: String,

    /// Empty = any public host permitted.
    pub fetch_allowed_hosts: Vec<String>,
    pub browser_executable_path: Option<String>,
    pub webhook_proxy_base: Option<String>,

    pub sweep_interval_minutes: u64,
    pub item_pacing_ms: u64,
    pub fx_refresh_interval_minutes: u64,

    pub discord_webhook: Option<String>,
    pub telegram_webhook_host: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let state_dir = env::var("STATE_DIR").unwrap_or_else(|_| "./data".to_string());

        let fetch_allowed_hosts = env::var("FETCH_ALLOWED_HOSTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let browser_executable_path = env::var("BROWSER_EXECUTABLE_PATH").ok();
        let webhook_proxy_base = env::var("WEBHOOK_PROXY_BASE").ok();

        let sweep_interval_minutes = env::var("SWEEP_INTERVAL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let item_pacing_ms = env::var("ITEM_PACING_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2_000);

        let fx_refresh_interval_minutes = env::var("FX_REFRESH_INTERVAL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let discord_webhook = env::var("DISCORD_WEBHOOK_URL").ok();
        let telegram_webhook_host = env::var("TELEGRAM_API_HOST").ok();
        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        let telegram_chat_id = env::var("TELEGRAM_CHAT_ID").ok();

        Ok(Self {
            port,
            state_dir,
            fetch_allowed_hosts,
            browser_executable_path,
            webhook_proxy_base,
            sweep_interval_minutes,
            item_pacing_ms,
            fx_refresh_interval_minutes,
            discord_webhook,
            telegram_webhook_host,
            telegram_bot_token,
            telegram_chat_id,
        })
    }
}
