//! # Bottex
//!
//! A chat-bot dispatch framework. Messages arrive from platform receivers,
//! pass through a middleware pipeline and are routed by the user's current
//! conversation state to a [`View`](prelude::View), whose commands reply and
//! switch the user to the next state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐
//! │ Telegram │──┐   ┌──────────────────────────────┐   ┌───────────────┐   ┌────────┐
//! └──────────┘  ├──▶│ Logging ─▶ Users ─▶ Format   │──▶│ Router(state) │──▶│  View  │
//! ┌──────────┐  │   │        (tower layers)        │   └───────────────┘   └────────┘
//! │    VK    │──┘   └──────────────────────────────┘                           │
//! └──────────┘                                                      Chat::send ◀┘
//! ```
//!
//! - **Receivers**: one long-polling task per platform
//! - **Middleware**: `tower` layers wrapped around the root handler
//! - **Routers**: ordered `condition → handler` tables with a default
//! - **Views**: named states with numbered commands and a reply keyboard
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bottex::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     let mut bottex = Bottex::from_config(&config);
//!     bottex.register_receiver::<TelegramReceiver>()?;
//!
//!     let store = Arc::new(MemoryUserStore::new());
//!     bottex.add_middleware(LoggingLayer::new());
//!     bottex.add_middleware(UsersLayer::new(store));
//!     bottex.set_handler(Router::from_routes(gen_state_cases(views), default));
//!
//!     bottex.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `telegram`: Telegram Bot API receiver (default)
//! - `vk`: VK Bots Long Poll receiver (default)
//! - `sqlite`: SQLite user store (default)
//! - `toml-config` / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output

pub use bottex_core as core;
pub use bottex_framework as framework;
pub use bottex_runtime as runtime;

#[cfg(feature = "telegram")]
pub use bottex_adapter_telegram as telegram;
#[cfg(feature = "vk")]
pub use bottex_adapter_vk as vk;
#[cfg(feature = "sqlite")]
pub use bottex_store_sqlite as sqlite;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use bottex::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use bottex_runtime::{Bottex, BottexConfig, ConfigLoader, StorageBackend};

    // Request flow
    pub use bottex_core::{Chat, Keyboard, Reply, Request, User, UserStore, UserUpdate};

    // Routing and views
    pub use bottex_framework::condition::{always, contains, in_state, text_eq};
    pub use bottex_framework::{
        Command, CommandList, Handler, HandlerResult, IntoReply, Route, Router, View,
        gen_state_cases, router,
    };

    // Middleware
    pub use bottex_framework::{FormatLayer, LoggingLayer, UsersLayer};

    // Storage
    pub use bottex_framework::MemoryUserStore;
    #[cfg(feature = "sqlite")]
    pub use bottex_store_sqlite::SqliteUserStore;

    // Receivers
    #[cfg(feature = "telegram")]
    pub use bottex_adapter_telegram::TelegramReceiver;
    #[cfg(feature = "vk")]
    pub use bottex_adapter_vk::VkReceiver;
}
