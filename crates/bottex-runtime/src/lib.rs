//! Bottex Runtime - orchestration layer for the Bottex framework.
//!
//! This crate provides:
//! - The [`Bottex`] runtime: one listen task per receiver, all feeding one
//!   middleware pipeline
//! - Layered configuration ([`ConfigLoader`], [`BottexConfig`])
//! - Logging setup ([`LoggingBuilder`])
//!
//! ```ignore
//! use bottex_runtime::Bottex;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bottex = Bottex::new();
//!     bottex.register_receiver::<TelegramReceiver>()?;
//!     bottex.set_handler(router);
//!     bottex.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    BottexConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, SpanEventConfig,
    StorageBackend, StorageConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{Bottex, RuntimeBuilder};

pub use tokio_util::sync::CancellationToken;
pub use tracing;

/// Logging macros for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
