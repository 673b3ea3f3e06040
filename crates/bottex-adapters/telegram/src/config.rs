//! Configuration for the Telegram receiver.

use std::time::Duration;

use bottex_core::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};

/// Telegram receiver configuration (`[receivers.telegram]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: String,

    /// Bot API base URL.
    pub api_url: String,

    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,

    /// HTTP timeout for every call; must exceed the poll timeout.
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 25,
            request_timeout_secs: 35,
        }
    }
}

impl TelegramConfig {
    /// Creates a configuration with the given token and default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Checks the configuration for values the API would reject.
    pub fn validate(&self) -> TransportResult<()> {
        if self.token.trim().is_empty() {
            return Err(TransportError::InvalidConfig("telegram token is empty".into()));
        }
        if self.request_timeout_secs <= self.poll_timeout_secs {
            return Err(TransportError::InvalidConfig(format!(
                "request_timeout_secs ({}) must exceed poll_timeout_secs ({})",
                self.request_timeout_secs, self.poll_timeout_secs
            )));
        }
        Ok(())
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_token() {
        let config = TelegramConfig::default();
        assert!(matches!(config.validate(), Err(TransportError::InvalidConfig(_))));
        assert!(TelegramConfig::new("123:abc").validate().is_ok());
    }

    #[test]
    fn test_timeouts_are_checked() {
        let config = TelegramConfig {
            poll_timeout_secs: 30,
            request_timeout_secs: 30,
            ..TelegramConfig::new("123:abc")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_section() {
        let config: TelegramConfig =
            serde_json::from_value(serde_json::json!({"token": "t"})).unwrap();
        assert_eq!(config.token, "t");
        assert_eq!(config.poll_timeout_secs, 25);
    }
}
