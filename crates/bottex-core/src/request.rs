//! The inbound request envelope.
//!
//! A [`Request`] is created once per platform event by a
//! [`Receiver`](crate::receiver::Receiver). On its way to the router it is
//! moved hop by hop; middleware may replace its [`Chat`] with a decorating
//! chat ([`Request::map_chat`]) or attach the resolved user
//! ([`Request::with_user`]). Nothing else about it changes.

use serde_json::Value;

use crate::chat::{BoxedChat, Reply};
use crate::keyboard::Keyboard;
use crate::user::UserHandle;

/// The raw platform payload a request was built from.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Platform name (`"telegram"`, `"vk"`, ...).
    pub platform: &'static str,
    /// The platform's identifier of the sender, if the event has one.
    pub sender_id: Option<String>,
    /// The untouched platform payload.
    pub payload: Value,
}

impl RawEvent {
    /// Creates a raw event.
    pub fn new(platform: &'static str, sender_id: Option<String>, payload: Value) -> Self {
        Self {
            platform,
            sender_id,
            payload,
        }
    }
}

/// One inbound message travelling through the dispatch pipeline.
pub struct Request {
    /// Message text.
    pub text: String,
    /// The chat replies go to. May be a decorator chain installed by middleware.
    pub chat: BoxedChat,
    /// The raw platform event.
    pub raw: RawEvent,
    /// The persisted user, once resolved by middleware.
    pub user: Option<UserHandle>,
}

impl Request {
    /// Creates a request without a resolved user.
    pub fn new(text: impl Into<String>, chat: BoxedChat, raw: RawEvent) -> Self {
        Self {
            text: text.into(),
            chat,
            raw,
            user: None,
        }
    }

    /// Returns the originating platform name.
    pub fn platform(&self) -> &'static str {
        self.raw.platform
    }

    /// Returns the sender's platform id.
    pub fn sender_id(&self) -> Option<&str> {
        self.raw.sender_id.as_deref()
    }

    /// Returns the resolved user, if any.
    pub fn user(&self) -> Option<&UserHandle> {
        self.user.as_ref()
    }

    /// Replaces the chat with `f(chat)`.
    ///
    /// Used by middleware to install a decorating chat that owns the previous one.
    pub fn map_chat<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BoxedChat) -> BoxedChat,
    {
        self.chat = f(self.chat);
        self
    }

    /// Attaches the resolved user.
    pub fn with_user(mut self, user: UserHandle) -> Self {
        self.user = Some(user);
        self
    }

    /// Sends a plain text reply.
    pub async fn reply(&self, text: &str) -> Reply {
        self.chat.send(text, None).await
    }

    /// Sends a reply with a keyboard.
    pub async fn reply_with(&self, text: &str, keyboard: &Keyboard) -> Reply {
        self.chat.send(text, Some(keyboard)).await
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("text", &self.text)
            .field("platform", &self.raw.platform)
            .field("sender_id", &self.raw.sender_id)
            .field("user", &self.user.as_ref().map(UserHandle::id))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Chat;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct RecordingChat(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Chat for RecordingChat {
        async fn send(&self, text: &str, _keyboard: Option<&Keyboard>) -> Reply {
            self.0.lock().push(text.to_string());
            Reply::Sent
        }
    }

    struct PrefixChat(BoxedChat);

    #[async_trait]
    impl Chat for PrefixChat {
        async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
            self.0.send(&format!("> {text}"), keyboard).await
        }
    }

    #[tokio::test]
    async fn test_map_chat_decorates_replies() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let request = Request::new(
            "hi",
            Box::new(RecordingChat(sent.clone())),
            RawEvent::new("test", Some("7".into()), Value::Null),
        )
        .map_chat(|chat| Box::new(PrefixChat(chat)));

        assert_eq!(request.reply("hello").await, Reply::Sent);
        assert_eq!(*sent.lock(), vec!["> hello".to_string()]);
        assert_eq!(request.sender_id(), Some("7"));
        assert_eq!(request.platform(), "test");
        assert!(request.user().is_none());
    }
}
