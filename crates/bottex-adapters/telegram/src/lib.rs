//! Telegram receiver for Bottex.
//!
//! Long-polls the Bot API with `getUpdates` and answers with `sendMessage`.
//! Only text messages become requests; everything else is acknowledged and
//! skipped.
//!
//! ```toml
//! [receivers.telegram]
//! token = "123456:ABC-DEF"
//! poll_timeout_secs = 25
//! ```
//!
//! ```rust,ignore
//! bottex.register_receiver::<TelegramReceiver>()?;
//! ```

mod api;
mod chat;
pub mod config;
pub mod model;
mod receiver;

pub use api::TelegramApi;
pub use chat::TelegramChat;
pub use config::TelegramConfig;
pub use receiver::TelegramReceiver;

/// Platform name stamped on requests and used as the configuration key.
pub const PLATFORM: &str = "telegram";
