//! Bot API client.

use bottex_core::{TransportError, TransportResult};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::config::TelegramConfig;
use crate::model::ApiResponse;

/// A thin Bot API client. Cloning shares the connection pool.
#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Creates a client from configuration.
    pub fn new(config: &TelegramConfig) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.token),
        })
    }

    /// Calls a Bot API method and decodes its `result`.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> TransportResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        trace!(method, "Calling Telegram API");
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: ApiResponse = response.json().await.map_err(transport_error)?;
        let result: Value = envelope.into_result()?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Maps a reqwest failure onto the transport taxonomy.
///
/// The request URL carries the bot token and is stripped from the message.
pub(crate) fn transport_error(err: reqwest::Error) -> TransportError {
    let err = err.without_url();
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use bottex_core::{Chat, Reply};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::chat::TelegramChat;

    const TOKEN: &str = "123456:SECRET-TOKEN";

    fn api_at(addr: SocketAddr) -> TelegramApi {
        let config = TelegramConfig {
            api_url: format!("http://{addr}"),
            request_timeout_secs: 1,
            ..TelegramConfig::new(TOKEN)
        };
        TelegramApi::new(&config).unwrap()
    }

    /// Accepts connections and never answers them.
    async fn silent_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }

    /// An address nothing listens on.
    async fn closed_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn test_connection_error_hides_token() {
        let api = api_at(closed_port().await);
        let err = api
            .call::<_, Value>("sendMessage", &json!({"chat_id": 1, "text": "hi"}))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Connection(_)), "{err:?}");
        assert!(!format!("{err:?}").contains(TOKEN));
        assert!(!err.to_string().contains(TOKEN));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let api = api_at(silent_server().await);
        let err = api.call::<_, Value>("getMe", &json!({})).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout), "{err:?}");
    }

    #[tokio::test]
    async fn test_send_timeout_is_reported_as_failed() {
        let chat = TelegramChat::new(api_at(silent_server().await), 7);
        assert_eq!(chat.send("hello", None).await, Reply::Failed);
    }
}
