//! Replying into a Telegram chat.

use async_trait::async_trait;
use bottex_core::{Chat, Keyboard, Reply, TransportResult, report_delivery};
use serde_json::Value;

use crate::PLATFORM;
use crate::api::TelegramApi;
use crate::model::{ReplyKeyboardMarkup, SendMessage};

/// A [`Chat`] bound to one Telegram chat id.
pub struct TelegramChat {
    api: TelegramApi,
    chat_id: i64,
}

impl TelegramChat {
    /// Creates a chat handle.
    pub fn new(api: TelegramApi, chat_id: i64) -> Self {
        Self { api, chat_id }
    }

    /// Returns the chat id.
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    async fn send_message(&self, text: &str, keyboard: Option<&Keyboard>) -> TransportResult<()> {
        let body = SendMessage {
            chat_id: self.chat_id,
            text,
            reply_markup: keyboard.and_then(ReplyKeyboardMarkup::from_keyboard),
        };
        let _: Value = self.api.call("sendMessage", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl Chat for TelegramChat {
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
        report_delivery(PLATFORM, self.send_message(text, keyboard).await)
    }
}
