//! Ideal Man
//!
//! A small evening planner: the bot walks the user through four rounds of
//! choices and then starts over.
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │
//! (none) ─▶ Round1 ──▶ Round2 ──▶ Round3 ──▶ Round4 ─────┘
//!            ▲
//!            └── Success (any input)
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ideal-man -- --config bottex.toml
//! ```
//!
//! with a configuration such as
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! path = "ideal_man.db"
//!
//! [receivers.telegram]
//! token = "123456:ABC"
//!
//! [receivers.vk]
//! token = "vk1.a.xyz"
//! group_id = 123456
//! ```

mod logic;

use std::path::PathBuf;

use anyhow::{Result, bail};
use bottex::prelude::*;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to bottex.toml in the usual places)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (development, production or custom)
    #[arg(short, long)]
    profile: Option<String>,
}

fn user_store(config: &BottexConfig) -> Result<Arc<dyn UserStore>> {
    Ok(match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory user store; conversation state is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
        StorageBackend::Sqlite => Arc::new(SqliteUserStore::open(&config.storage.path)?),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = Bottex::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let mut bottex = builder.build()?;

    if bottex.has_receiver_config(bottex::telegram::PLATFORM) {
        bottex.register_receiver::<TelegramReceiver>()?;
    }
    if bottex.has_receiver_config(bottex::vk::PLATFORM) {
        bottex.register_receiver::<VkReceiver>()?;
    }
    if bottex.receiver_count() == 0 {
        bail!("no receivers configured; add a [receivers.telegram] or [receivers.vk] section");
    }

    let store = user_store(bottex.config())?;
    bottex.add_middleware(LoggingLayer::new());
    bottex.add_middleware(UsersLayer::new(store));
    bottex.add_middleware(FormatLayer::default());
    bottex.set_handler(logic::main_router());

    info!(receivers = bottex.receiver_count(), "Ideal Man is up");
    bottex.run().await?;
    Ok(())
}
