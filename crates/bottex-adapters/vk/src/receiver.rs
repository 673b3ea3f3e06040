//! Bots Long Poll receiver.

use async_trait::async_trait;
use bottex_core::{ConfigurableReceiver, Receiver, Request, TransportResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::PLATFORM;
use crate::api::VkApi;
use crate::chat::VkChat;
use crate::config::VkConfig;
use crate::model::{self, LongPollServer, PollOutcome};

/// Receives `message_new` events through Bots Long Poll.
pub struct VkReceiver {
    api: VkApi,
    group_id: i64,
    wait_secs: u64,
    server: Option<LongPollServer>,
}

impl VkReceiver {
    /// Creates a receiver. The long poll server is fetched on the first poll.
    pub fn new(config: VkConfig) -> TransportResult<Self> {
        config.validate()?;
        Ok(Self {
            api: VkApi::new(&config)?,
            group_id: config.group_id,
            wait_secs: config.wait_secs,
            server: None,
        })
    }

    /// Applies an `a_check` outcome and returns the requests it carries.
    fn accept(&mut self, outcome: PollOutcome) -> Vec<Request> {
        match outcome {
            PollOutcome::Events { ts, updates } => {
                if let Some(server) = self.server.as_mut() {
                    server.ts = ts;
                }
                updates
                    .into_iter()
                    .filter_map(|event| {
                        let Some(message) = model::new_message(&event) else {
                            debug!(platform = PLATFORM, "Skipping non-message event");
                            return None;
                        };
                        let chat = VkChat::new(self.api.clone(), message.peer_id);
                        Some(self.request(message.text, Box::new(chat), event))
                    })
                    .collect()
            }
            PollOutcome::Resync { ts } => {
                warn!(platform = PLATFORM, ts = %ts, "Long poll history outdated, resyncing");
                if let Some(server) = self.server.as_mut() {
                    server.ts = ts;
                }
                Vec::new()
            }
            PollOutcome::Reconnect => {
                warn!(platform = PLATFORM, "Long poll key expired, reconnecting");
                self.server = None;
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Receiver for VkReceiver {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn sender_id(&self, payload: &Value) -> Option<String> {
        model::sender_id(payload)
    }

    async fn poll_updates(&mut self) -> TransportResult<Vec<Request>> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => {
                let server = self.api.long_poll_server(self.group_id).await?;
                info!(platform = PLATFORM, group_id = self.group_id, "Connected to long poll server");
                self.server = Some(server.clone());
                server
            }
        };
        let response = self.api.check(&server, self.wait_secs).await?;
        Ok(self.accept(response.outcome()))
    }
}

impl ConfigurableReceiver for VkReceiver {
    type Config = VkConfig;

    fn name() -> &'static str {
        PLATFORM
    }

    fn from_config(config: VkConfig) -> TransportResult<Self> {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receiver() -> VkReceiver {
        let mut receiver = VkReceiver::new(VkConfig::new("token", 1)).unwrap();
        receiver.server = Some(LongPollServer {
            key: "k".into(),
            server: "https://lp.vk.com/wh1".into(),
            ts: "1".into(),
        });
        receiver
    }

    #[tokio::test]
    async fn test_accept_events() {
        let mut receiver = receiver();
        let requests = receiver.accept(PollOutcome::Events {
            ts: "2".into(),
            updates: vec![
                json!({"type": "message_new", "object": {"message": {"peer_id": 7, "from_id": 7, "text": "Hi"}}}),
                json!({"type": "message_reply", "object": {}}),
            ],
        });

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "Hi");
        assert_eq!(requests[0].platform(), "vk");
        assert_eq!(requests[0].sender_id(), Some("7"));
        assert_eq!(receiver.server.as_ref().unwrap().ts, "2");
    }

    #[test]
    fn test_failures_update_server_state() {
        let mut receiver = receiver();
        assert!(receiver.accept(PollOutcome::Resync { ts: "40".into() }).is_empty());
        assert_eq!(receiver.server.as_ref().unwrap().ts, "40");

        assert!(receiver.accept(PollOutcome::Reconnect).is_empty());
        assert!(receiver.server.is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(VkReceiver::from_config(VkConfig::default()).is_err());
    }
}
