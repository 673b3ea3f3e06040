//! Replying into a VK conversation.

use async_trait::async_trait;
use bottex_core::{Chat, Keyboard, Reply, TransportResult, report_delivery};
use serde_json::Value;
use uuid::Uuid;

use crate::PLATFORM;
use crate::api::VkApi;

/// A [`Chat`] bound to one VK peer.
pub struct VkChat {
    api: VkApi,
    peer_id: i64,
}

impl VkChat {
    pub fn new(api: VkApi, peer_id: i64) -> Self {
        Self { api, peer_id }
    }

    pub fn peer_id(&self) -> i64 {
        self.peer_id
    }

    async fn send_message(&self, text: &str, keyboard: Option<&Keyboard>) -> TransportResult<()> {
        let mut params = vec![
            ("peer_id", self.peer_id.to_string()),
            ("message", text.to_string()),
            ("random_id", random_id().to_string()),
        ];
        if let Some(keyboard) = keyboard {
            params.push(("keyboard", keyboard.to_wire()?));
        }
        let _: Value = self.api.call("messages.send", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl Chat for VkChat {
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
        report_delivery(PLATFORM, self.send_message(text, keyboard).await)
    }
}

/// A non-negative int32 used by VK to deduplicate sends.
fn random_id() -> i32 {
    (Uuid::new_v4().as_u128() as u32 & i32::MAX as u32) as i32
}
