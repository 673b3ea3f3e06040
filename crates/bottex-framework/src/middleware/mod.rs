//! Middleware as tower layers.
//!
//! Every middleware is a [`tower::Layer`] over [`Handler`](crate::Handler)
//! whose service may rewrite the [`Request`](bottex_core::Request) before
//! delegating, usually by wrapping `request.chat` in a decorating chat:
//!
//! ```text
//! registered: [Logging, Users, Format]
//!
//! inbound :  Logging ─▶ Users ─▶ Format ─▶ router
//! outbound:  FormattingChat ─▶ LoggingChat ─▶ platform chat
//! ```
//!
//! Each request gets fresh decorators that own the chat they wrap; nothing
//! is shared between requests.

mod format;
mod logging;
mod users;

pub use format::{FormatLayer, FormatService, FormattingChat, INVISIBLE_SPACE};
pub use logging::{LoggingChat, LoggingLayer, LoggingService};
pub use users::{UsersLayer, UsersService};
