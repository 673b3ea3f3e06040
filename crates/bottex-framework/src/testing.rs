//! Shared test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use bottex_core::{BoxedChat, Chat, Keyboard, RawEvent, Reply, Request};
use parking_lot::Mutex;

/// Everything a [`RecordingChat`] was asked to send.
#[derive(Clone, Default)]
pub struct Sent(Arc<Mutex<Vec<(String, Option<Keyboard>)>>>);

impl Sent {
    pub fn texts(&self) -> Vec<String> {
        self.0.lock().iter().map(|(t, _)| t.clone()).collect()
    }
}

pub struct RecordingChat(Sent);

impl RecordingChat {
    pub fn new() -> (BoxedChat, Sent) {
        let sent = Sent::default();
        (Box::new(RecordingChat(sent.clone())), sent)
    }
}

#[async_trait]
impl Chat for RecordingChat {
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
        self.0.0.lock().push((text.to_string(), keyboard.cloned()));
        Reply::Sent
    }
}

/// A request from sender `"1"` on the `test` platform.
pub fn request(text: &str, chat: BoxedChat) -> Request {
    Request::new(text, chat, RawEvent::new("test", Some("1".into()), serde_json::Value::Null))
}
