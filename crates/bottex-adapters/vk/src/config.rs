//! Configuration for the VK receiver.

use std::time::Duration;

use bottex_core::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};

/// VK receiver configuration (`[receivers.vk]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VkConfig {
    /// Community access token.
    pub token: String,

    /// Community id.
    pub group_id: i64,

    /// API version sent with every call.
    pub api_version: String,

    /// API base URL.
    pub api_url: String,

    /// Long poll `wait` in seconds.
    pub wait_secs: u64,

    /// HTTP timeout for every call; must exceed `wait_secs`.
    pub request_timeout_secs: u64,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            group_id: 0,
            api_version: "5.131".to_string(),
            api_url: "https://api.vk.com/method".to_string(),
            wait_secs: 25,
            request_timeout_secs: 35,
        }
    }
}

impl VkConfig {
    /// Creates a configuration with the given credentials and default settings.
    pub fn new(token: impl Into<String>, group_id: i64) -> Self {
        Self {
            token: token.into(),
            group_id,
            ..Default::default()
        }
    }

    /// Checks the configuration for values the API would reject.
    pub fn validate(&self) -> TransportResult<()> {
        if self.token.trim().is_empty() {
            return Err(TransportError::InvalidConfig("vk token is empty".into()));
        }
        if self.group_id <= 0 {
            return Err(TransportError::InvalidConfig(format!(
                "vk group_id must be positive, got {}",
                self.group_id
            )));
        }
        if self.request_timeout_secs <= self.wait_secs {
            return Err(TransportError::InvalidConfig(format!(
                "request_timeout_secs ({}) must exceed wait_secs ({})",
                self.request_timeout_secs, self.wait_secs
            )));
        }
        Ok(())
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
