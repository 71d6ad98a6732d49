use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    Html,
    PlainText,
}

/// A composed message plus the delivery options the channel should apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    pub parse_mode: ParseMode,
    pub disable_link_preview: bool,
}

impl OutboundMessage {
    /// Rich-text message with link previews suppressed.
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Markdown,
            disable_link_preview: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub parts_sent: usize,
    pub message_ids: Vec<i64>,
}

/// Trait for implementing notification channels (Telegram, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Deliver one message. Splitting to fit the channel's size limit is the
    /// notifier's job.
    async fn notify(&self, message: &OutboundMessage) -> Result<NotificationResult, DeliveryError>;

    /// Plugin lifecycle
    async fn shutdown(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
