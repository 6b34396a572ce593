//! Notification sinks: webhook, Telegram-style chat bot, and a best-effort
//! local desktop notifier. Each fire dispatches to every configured sink;
//! one sink failing never blocks the others.

pub mod desktop;
pub mod telegram;
pub mod webhook;

use async_trait::async_trait;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()>;

    /// Short tag used in logs when a sink fails.
    fn name(&self) -> &'static str;
}

/// Dispatch `(title, body)` to every sink, logging (not propagating)
/// individual failures.
pub async fn dispatch(sinks: &[Box<dyn NotificationSink>], title: &str, body: &str) {
    for sink in sinks {
        if let Err(err) = sink.send(title, body).await {
            tracing::warn!(sink = sink.name(), error = %err, "notification sink failed");
        }
    }
}
