//! Long-polling receiver.

use async_trait::async_trait;
use bottex_core::{ConfigurableReceiver, Receiver, Request, TransportResult};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::PLATFORM;
use crate::api::TelegramApi;
use crate::chat::TelegramChat;
use crate::config::TelegramConfig;
use crate::model::{self, Update};

/// Receives text messages through `getUpdates` long polling.
pub struct TelegramReceiver {
    api: TelegramApi,
    poll_timeout_secs: u64,
    offset: i64,
}

impl TelegramReceiver {
    /// Creates a receiver.
    pub fn new(config: TelegramConfig) -> TransportResult<Self> {
        config.validate()?;
        Ok(Self {
            api: TelegramApi::new(&config)?,
            poll_timeout_secs: config.poll_timeout_secs,
            offset: 0,
        })
    }

    /// Turns raw updates into requests and advances the offset past all of
    /// them, including the ones that are skipped.
    fn accept(&mut self, updates: Vec<Value>) -> Vec<Request> {
        let mut requests = Vec::with_capacity(updates.len());
        for payload in updates {
            let update: Update = match serde_json::from_value(payload.clone()) {
                Ok(update) => update,
                Err(e) => {
                    warn!(platform = PLATFORM, error = %e, "Skipping malformed update");
                    if let Some(id) = payload.get("update_id").and_then(Value::as_i64) {
                        self.offset = self.offset.max(id + 1);
                    }
                    continue;
                }
            };
            self.offset = self.offset.max(update.update_id + 1);

            let Some((chat_id, text)) = update.text_message() else {
                debug!(platform = PLATFORM, update_id = update.update_id, "Skipping non-text update");
                continue;
            };
            let chat = TelegramChat::new(self.api.clone(), chat_id);
            requests.push(self.request(text.to_string(), Box::new(chat), payload));
        }
        requests
    }
}

#[async_trait]
impl Receiver for TelegramReceiver {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn sender_id(&self, payload: &Value) -> Option<String> {
        model::sender_id(payload)
    }

    async fn poll_updates(&mut self) -> TransportResult<Vec<Request>> {
        let params = json!({
            "offset": self.offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let updates: Vec<Value> = self.api.call("getUpdates", &params).await?;
        Ok(self.accept(updates))
    }
}

impl ConfigurableReceiver for TelegramReceiver {
    type Config = TelegramConfig;

    fn name() -> &'static str {
        PLATFORM
    }

    fn from_config(config: TelegramConfig) -> TransportResult<Self> {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_advances_offset_past_skipped_updates() {
        let mut receiver = TelegramReceiver::new(TelegramConfig::new("123:abc")).unwrap();
        let requests = receiver.accept(vec![
            json!({"update_id": 5, "message": {"message_id": 1, "chat": {"id": 9}, "from": {"id": 3}, "text": "2"}}),
            json!({"update_id": 6, "message": {"message_id": 2, "chat": {"id": 9}}}),
            json!({"update_id": 7, "edited_message": {}}),
            json!({"garbage": true}),
        ]);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "2");
        assert_eq!(requests[0].platform(), "telegram");
        assert_eq!(requests[0].sender_id(), Some("3"));
        assert_eq!(receiver.offset, 8);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(TelegramReceiver::from_config(TelegramConfig::default()).is_err());
    }
}
