use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::config::Config;

/// Fire-and-forget Telegram notifications.
///
/// Missing credentials downgrade every call to a no-op, and send failures are
/// swallowed at debug level. A notification must never take a scan down.
pub struct Notifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            token: cfg.telegram_token.clone(),
            chat_id: cfg.telegram_chat_id.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }

    pub async fn notify(&self, text: &str) {
        if !self.is_configured() {
            debug!("notification skipped, telegram not configured");
            return;
        }
        if let Err(e) = self.send(text).await {
            debug!("telegram send failed: {e}");
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        self.client
            .get(&url)
            .query(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await
            .context("Failed to reach telegram")?
            .error_for_status()
            .context("Telegram rejected the message")?;
        Ok(())
    }
}
