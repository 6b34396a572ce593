//! Telegram-style chat bot sink: `POST {chat_id, text, parse_mode: "Markdown"}`.

use async_trait::async_trait;
use serde::Serialize;

use super::NotificationSink;

#[derive(Serialize)]
struct SendMessageBody {
    chat_id: String,
    text: String,
    parse_mode: &'static str,
}

pub struct TelegramSink {
    bot_url: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramSink {
    pub fn new(bot_url: String, chat_id: String) -> Self {
        Self {
            bot_url,
            chat_id,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("telegram http client"),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let payload = SendMessageBody {
            chat_id: self.chat_id.clone(),
            text: format!("*{title}*\n{body}"),
            parse_mode: "Markdown",
        };
        self.client.post(&self.bot_url).json(&payload).send().await?.error_for_status()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
