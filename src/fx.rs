//! FX Table: USD-relative currency rates, refreshed hourly from an
//! external rate service. Reads and writes go through a `parking_lot`
//! lock so callers never block on an in-flight refresh longer than the
//! HTTP round-trip itself.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("TRY", 32.5),
    ("JPY", 151.0),
    ("CNY", 7.2),
    ("CAD", 1.36),
    ("AUD", 1.52),
];

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

pub struct FxTable {
    rates: RwLock<HashMap<String, f64>>,
    feed_url: String,
    client: reqwest::Client,
}

impl FxTable {
    pub fn new(feed_url: String) -> Self {
        let rates = DEFAULT_RATES.iter().map(|(c, r)| (c.to_string(), *r)).collect();
        Self {
            rates: RwLock::new(rates),
            feed_url,
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .user_agent("stockwatch-engine/0.1")
                .build()
                .expect("fx http client"),
        }
    }

    /// `amount / rate[currency]`; unchanged if no rate is known, `None` if
    /// `amount` isn't finite.
    pub fn to_usd(&self, amount: f64, currency: &str) -> Option<f64> {
        if !amount.is_finite() {
            return None;
        }
        let rates = self.rates.read();
        match rates.get(currency) {
            Some(rate) if *rate != 0.0 => Some(amount / rate),
            _ => Some(amount),
        }
    }

    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.rates.read().clone()
    }

    async fn refresh_once(&self) -> Result<(), reqwest::Error> {
        let response = self.client.get(&self.feed_url).send().await?.error_for_status()?;
        let parsed: RatesResponse = response.json().await?;

        let mut rates = self.rates.write();
        for (currency, rate) in parsed.rates {
            if rate.is_finite() && rate > 0.0 {
                rates.insert(currency, rate);
            }
        }
        rates.insert("USD".to_string(), 1.0);
        Ok(())
    }

    /// Spawns the periodic refresh loop. Keeps previous rates on failure.
    pub fn spawn_refresh_task(self: std::sync::Arc<Self>, refresh_interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh_interval);
            loop {
                interval.tick().await;
                match self.refresh_once().await {
                    Ok(()) => info!("fx rates refreshed"),
                    Err(err) => warn!(error = %err, "fx refresh failed, keeping previous rates"),
                }
            }
        })
    }
}

impl Default for FxTable {
    fn default() -> Self {
        Self::new("https://open.er-api.com/v6/latest/USD".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_is_pinned_to_one() {
        let fx = FxTable::default();
        assert_eq!(fx.to_usd(100.0, "USD"), Some(100.0));
    }

    #[test]
    fn unknown_currency_returns_amount_unchanged() {
        let fx = FxTable::default();
        assert_eq!(fx.to_usd(50.0, "XXX"), Some(50.0));
    }

    #[test]
    fn non_finite_amount_returns_none() {
        let fx = FxTable::default();
        assert_eq!(fx.to_usd(f64::NAN, "USD"), None);
        assert_eq!(fx.to_usd(f64::INFINITY, "USD"), None);
    }

    #[test]
    fn known_currency_divides_by_rate() {
        let fx = FxTable::default();
        let converted = fx.to_usd(325.0, "TRY").unwrap();
        assert!((converted - 10.0).abs() < 0.01);
    }
}
