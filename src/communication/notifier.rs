use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Delivery error: {0}")]
    DeliveryError(String),
    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Sends a plain-text message to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: i64, text: &str) -> Result<(), NotificationError>;
}

pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipient: i64, text: &str) -> Result<(), NotificationError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map_err(|e| NotificationError::DeliveryError(e.to_string()))?;
        Ok(())
    }
}
