//! Local desktop notifier. This service runs headless, so there's no
//! desktop session to notify; kept as a sink so the dispatch fan-out
//! doesn't special-case it, but `send` is a no-op.

use async_trait::async_trait;

use super::NotificationSink;

pub struct DesktopSink;

#[async_trait]
impl NotificationSink for DesktopSink {
    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()> {
        tracing::debug!(title, body, "desktop notification skipped (headless deployment)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "desktop"
    }
}
