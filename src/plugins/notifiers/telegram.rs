use crate::config::TelegramConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin, OutboundMessage, ParseMode};
use crate::utils::error::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Telegram rejects `sendMessage` text longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Delivers messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, DeliveryError> {
        // A hung sendMessage would otherwise hold up every later zone.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(TelegramNotifier { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn create_payload(&self, text: &str, message: &OutboundMessage) -> serde_json::Value {
        let mut payload = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "disable_web_page_preview": message.disable_link_preview,
        });

        match message.parse_mode {
            ParseMode::Markdown => payload["parse_mode"] = json!("Markdown"),
            ParseMode::Html => payload["parse_mode"] = json!("HTML"),
            ParseMode::PlainText => {}
        }

        payload
    }

    async fn send_part(&self, text: &str, message: &OutboundMessage) -> Result<Option<i64>, DeliveryError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.create_payload(text, message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<SendMessageResponse>(&body) {
            Ok(parsed) if !parsed.ok => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: parsed.description.unwrap_or(body),
            }),
            Ok(parsed) => Ok(parsed.result.map(|m| m.message_id)),
            // Accepted but unreadable: treat as delivered.
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, message: &OutboundMessage) -> Result<NotificationResult, DeliveryError> {
        let parts = split_message(&message.text, MAX_MESSAGE_CHARS);
        let mut message_ids = Vec::with_capacity(parts.len());

        for part in &parts {
            if let Some(id) = self.send_part(part, message).await? {
                message_ids.push(id);
            }
        }

        tracing::debug!(parts = parts.len(), chat_id = %self.config.chat_id, "Telegram message delivered");
        Ok(NotificationResult {
            parts_sent: parts.len(),
            message_ids,
        })
    }
}

/// Split `text` into chunks of at most `limit` characters, breaking on line
/// boundaries where possible. A single line over the limit is hard-split.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };

        if needed <= limit {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            for chunk in chars.chunks(limit) {
                parts.push(chunk.iter().collect());
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current);
    }

    parts
}
