//! Platform receivers.
//!
//! A [`Receiver`] polls one platform and turns each inbound event into a
//! [`Request`]. [`Receiver::listen`] wraps the polling into a lazy, unbounded
//! stream that never ends on its own:
//!
//! ```text
//! ┌──────────────┐  Ok(batch)   ┌─────────┐   next()   ┌────────────┐
//! │ poll_updates │─────────────▶│  queue  │───────────▶│  Request   │
//! └──────────────┘              └─────────┘            └────────────┘
//!        │ Err(e)
//!        ▼
//!   log, sleep(retry_delay), poll again
//! ```
//!
//! Dropping the stream drops the receiver, which releases its transport.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, trace};

use crate::chat::BoxedChat;
use crate::error::TransportResult;
use crate::request::{RawEvent, Request};

/// Default pause between a failed poll and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A per-platform source of requests.
#[async_trait]
pub trait Receiver: Send + 'static {
    /// Platform name stamped on every request.
    fn platform(&self) -> &'static str;

    /// Extracts the sender's platform id from a raw payload.
    ///
    /// This is the hook user-resolving middleware relies on: the id ends up in
    /// [`RawEvent::sender_id`] and is used as the store key together with
    /// [`platform`](Self::platform).
    fn sender_id(&self, payload: &Value) -> Option<String>;

    /// Polls the platform once. May return an empty batch.
    async fn poll_updates(&mut self) -> TransportResult<Vec<Request>>;

    /// Pause after a failed poll.
    fn retry_delay(&self) -> Duration {
        DEFAULT_RETRY_DELAY
    }

    /// Builds a request for this platform from its parts.
    fn request(&self, text: String, chat: BoxedChat, payload: Value) -> Request {
        let sender_id = self.sender_id(&payload);
        Request::new(text, chat, RawEvent::new(self.platform(), sender_id, payload))
    }

    /// Turns the receiver into an endless stream of requests.
    ///
    /// Transport failures are logged and retried; they never end the stream.
    fn listen(self: Box<Self>) -> BoxStream<'static, Request> {
        stream::unfold((self, VecDeque::new()), |(mut receiver, mut queue)| async move {
            loop {
                if let Some(request) = queue.pop_front() {
                    return Some((request, (receiver, queue)));
                }
                match receiver.poll_updates().await {
                    Ok(batch) => {
                        trace!(platform = receiver.platform(), count = batch.len(), "Polled updates");
                        queue.extend(batch);
                    }
                    Err(e) => {
                        error!(platform = receiver.platform(), error = ?e, "Failed to poll updates");
                        tokio::time::sleep(receiver.retry_delay()).await;
                    }
                }
            }
        })
        .boxed()
    }
}

/// An owned, type-erased receiver.
pub type BoxedReceiver = Box<dyn Receiver>;

/// A receiver that can be built from a configuration section.
///
/// The runtime looks up `receivers.<name>` in the loaded configuration and
/// deserializes it into [`Config`](Self::Config).
pub trait ConfigurableReceiver: Receiver + Sized {
    /// The receiver's configuration type.
    type Config: DeserializeOwned + Default + Send;

    /// Configuration section name (`receivers.<name>`).
    fn name() -> &'static str;

    /// Builds the receiver.
    fn from_config(config: Self::Config) -> TransportResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Chat, Reply};
    use crate::error::TransportError;
    use crate::keyboard::Keyboard;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullChat;

    #[async_trait]
    impl Chat for NullChat {
        async fn send(&self, _text: &str, _keyboard: Option<&Keyboard>) -> Reply {
            Reply::NoReply
        }
    }

    /// Fails the first poll, then yields one batch per poll.
    struct FlakyReceiver {
        polls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Receiver for FlakyReceiver {
        fn platform(&self) -> &'static str {
            "flaky"
        }

        fn sender_id(&self, payload: &Value) -> Option<String> {
            payload.get("from").and_then(Value::as_str).map(str::to_string)
        }

        async fn poll_updates(&mut self) -> TransportResult<Vec<Request>> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                return Err(TransportError::Timeout);
            }
            Ok(vec![
                self.request(format!("{n}a"), Box::new(NullChat), serde_json::json!({"from": "u1"})),
                self.request(format!("{n}b"), Box::new(NullChat), Value::Null),
            ])
        }

        fn retry_delay(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    #[tokio::test]
    async fn test_listen_survives_transport_errors() {
        let polls = Arc::new(AtomicUsize::new(0));
        let receiver = Box::new(FlakyReceiver {
            polls: polls.clone(),
        });

        let texts: Vec<String> = receiver.listen().take(3).map(|r| r.text).collect().await;

        assert_eq!(texts, vec!["1a", "1b", "2a"]);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_request_uses_sender_hook() {
        let receiver = FlakyReceiver {
            polls: Arc::new(AtomicUsize::new(0)),
        };
        let request = receiver.request(
            "hi".into(),
            Box::new(NullChat),
            serde_json::json!({"from": "u1"}),
        );

        assert_eq!(request.platform(), "flaky");
        assert_eq!(request.sender_id(), Some("u1"));
    }
}
