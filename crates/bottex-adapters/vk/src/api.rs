//! VK API client.

use bottex_core::{TransportError, TransportResult};
use reqwest::{Client, ClientBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::config::VkConfig;
use crate::model::{self, LongPollResponse, LongPollServer};

/// A thin VK API client. Cloning shares the connection pool.
#[derive(Clone)]
pub struct VkApi {
    client: Client,
    api_url: String,
    token: String,
    version: String,
}

impl VkApi {
    /// Creates a client from configuration.
    pub fn new(config: &VkConfig) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            version: config.api_version.clone(),
        })
    }

    /// Calls an API method and decodes its `response`.
    ///
    /// Parameters and credentials travel in a form body, so message text is
    /// not limited by URL length and the token stays out of the URL.
    pub async fn call<R>(&self, method: &str, params: &[(&str, String)]) -> TransportResult<R>
    where
        R: DeserializeOwned,
    {
        trace!(method, "Calling VK API");
        let form: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain([("access_token", self.token.as_str()), ("v", self.version.as_str())])
            .collect();

        let body: Value = self
            .client
            .post(format!("{}/{method}", self.api_url))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(serde_json::from_value(model::decode_response(body)?)?)
    }

    /// Fetches long poll credentials for a community.
    pub async fn long_poll_server(&self, group_id: i64) -> TransportResult<LongPollServer> {
        self.call("groups.getLongPollServer", &[("group_id", group_id.to_string())])
            .await
    }

    /// Waits for events on a long poll server.
    pub async fn check(&self, server: &LongPollServer, wait_secs: u64) -> TransportResult<LongPollResponse> {
        let wait = wait_secs.to_string();
        let url = Url::parse_with_params(
            &server.server,
            [
                ("act", "a_check"),
                ("key", server.key.as_str()),
                ("ts", server.ts.as_str()),
                ("wait", wait.as_str()),
            ],
        )
        .map_err(|e| TransportError::Decode(format!("bad long poll server url: {e}")))?;

        self.client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)
    }
}

/// Maps a reqwest failure onto the transport taxonomy.
///
/// Long poll URLs carry the session key and are stripped from the message.
fn transport_error(err: reqwest::Error) -> TransportError {
    let err = err.without_url();
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
