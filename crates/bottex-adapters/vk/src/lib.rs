//! VK receiver for Bottex.
//!
//! Uses the Bots Long Poll API:
//!
//! ```text
//! groups.getLongPollServer ──▶ {server, key, ts}
//!          ▲                          │
//!          │ failed: 2 | 3            ▼
//!          └─────────────── a_check(key, ts, wait) ──▶ {ts, updates}
//!                                     ▲        │
//!                                     └────────┘ failed: 1 → new ts
//! ```
//!
//! `message_new` events become requests; replies go out through
//! `messages.send` with the keyboard in its JSON wire shape.
//!
//! ```toml
//! [receivers.vk]
//! token = "vk1.a.xyz"
//! group_id = 123456
//! ```

mod api;
mod chat;
pub mod config;
pub mod model;
mod receiver;

pub use api::VkApi;
pub use chat::VkChat;
pub use config::VkConfig;
pub use receiver::VkReceiver;

/// Platform name stamped on requests and used as the configuration key.
pub const PLATFORM: &str = "vk";
