//! # Bottex Core
//!
//! The core types of the Bottex chat-bot dispatch framework.
//!
//! Everything that crosses a crate boundary lives here:
//!
//! - **Request**: the envelope carrying inbound text, the reply [`Chat`] and
//!   the raw platform payload ([`Request`], [`RawEvent`])
//! - **Chat**: the capability to reply into one conversation ([`Chat`], [`Reply`])
//! - **Keyboard**: structured reply options and their wire shape ([`Keyboard`])
//! - **Receiver**: per-platform adapters producing a stream of requests ([`Receiver`])
//! - **Users**: the persisted conversation state consumed by routing ([`User`], [`UserStore`])
//!
//! ## Data Flow
//!
//! ```text
//! ┌────────────┐      ┌────────────┐      ┌─────────────┐      ┌──────────┐
//! │  Receiver  │─────▶│  Request   │─────▶│ Middlewares │─────▶│  Router  │
//! │ (Telegram) │      │ text/chat  │      │ (framework) │      │  (View)  │
//! └────────────┘      └────────────┘      └─────────────┘      └──────────┘
//!                           │                                        │
//!                           └────────────── Chat::send ◀─────────────┘
//! ```

pub mod chat;
pub mod error;
pub mod keyboard;
pub mod receiver;
pub mod request;
pub mod user;

pub use chat::{BoxedChat, Chat, Reply, report_delivery};
pub use error::{StoreError, StoreResult, TransportError, TransportResult};
pub use keyboard::{Button, Keyboard};
pub use receiver::{BoxedReceiver, ConfigurableReceiver, Receiver};
pub use request::{RawEvent, Request};
pub use user::{User, UserHandle, UserStore, UserUpdate};

/// Prelude for common imports.
pub mod prelude {
    pub use super::chat::{BoxedChat, Chat, Reply};
    pub use super::keyboard::Keyboard;
    pub use super::receiver::Receiver;
    pub use super::request::Request;
    pub use super::user::{User, UserHandle, UserStore, UserUpdate};
}
