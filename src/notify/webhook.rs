//! Discord-style webhook sink: `POST {content: "**title**\nbody"}`.
//!
//! Supports rewriting through a reverse-proxy base prefix that maps
//! `.../api/webhooks/{id}/{token}` to `<proxy>/webhooks/{id}/{token}`, for
//! deployments that front outbound webhook calls through their own proxy.

use async_trait::async_trait;
use serde::Serialize;

use super::NotificationSink;

#[derive(Serialize)]
struct WebhookBody {
    content: String,
}

pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: String, proxy_base: Option<&str>) -> Self {
        let url = match proxy_base {
            Some(base) => rewrite_through_proxy(&url, base),
            None => url,
        };
        Self {
            url,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("webhook http client"),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let payload = WebhookBody {
            content: format!("**{title}**\n{body}"),
        };
        self.client.post(&self.url).json(&payload).send().await?.error_for_status()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Rewrite `.../api/webhooks/{id}/{token}` to `<proxy>/webhooks/{id}/{token}`.
fn rewrite_through_proxy(url: &str, proxy_base: &str) -> String {
    match url.find("/api/webhooks/") {
        Some(idx) => format!("{}{}", proxy_base.trim_end_matches('/'), &url[idx + 4..]),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_rewrite_preserves_id_and_token() {
        let rewritten = rewrite_through_proxy(
            "https://discord.com/api/webhooks/123/abcXYZ",
            "https://proxy.example.com",
        );
        assert_eq!(rewritten, "https://proxy.example.com/webhooks/123/abcXYZ");
    }

    #[test]
    fn url_without_api_webhooks_passes_through() {
        let rewritten = rewrite_through_proxy("https://example.com/hook", "https://proxy.example.com");
        assert_eq!(rewritten, "https://example.com/hook");
    }
}
