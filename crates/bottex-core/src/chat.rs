//! Chat capability.
//!
//! A [`Chat`] is bound to exactly one conversation and knows how to deliver a
//! reply into it. Platform adapters provide the concrete variants; middleware
//! adds decorating variants that wrap another chat and intercept `send`.
//!
//! ```rust,ignore
//! struct ShoutingChat(BoxedChat);
//!
//! #[async_trait]
//! impl Chat for ShoutingChat {
//!     async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
//!         self.0.send(&text.to_uppercase(), keyboard).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::TransportResult;
use crate::keyboard::Keyboard;

/// Outcome of handling a request or sending a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A message was delivered to the platform.
    Sent,
    /// Delivery failed; the failure has already been logged.
    Failed,
    /// Nothing was sent.
    NoReply,
}

impl Reply {
    /// Returns `true` if a message reached the platform.
    pub fn is_sent(&self) -> bool {
        matches!(self, Reply::Sent)
    }
}

/// The capability to send a reply into a single conversation.
///
/// `send` never fails from the caller's point of view: transport errors are
/// logged by the implementation and reported as [`Reply::Failed`].
#[async_trait]
pub trait Chat: Send + Sync {
    /// Sends `text`, optionally with a reply keyboard.
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply;
}

/// An owned, type-erased chat.
pub type BoxedChat = Box<dyn Chat>;

/// Converts the result of a platform send call into a [`Reply`], logging
/// failures with their raw representation.
pub fn report_delivery(platform: &str, result: TransportResult<()>) -> Reply {
    match result {
        Ok(()) => {
            debug!(platform, "Message delivered");
            Reply::Sent
        }
        Err(e) => {
            error!(platform, error = ?e, "Failed to send message");
            Reply::Failed
        }
    }
}
