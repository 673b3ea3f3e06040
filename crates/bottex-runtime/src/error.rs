//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Receiver configuration deserialization failed.
    #[error("Failed to deserialize receiver config: {0}")]
    ReceiverConfigDeserialize(String),

    /// A receiver could not be built.
    #[error("Receiver error: {0}")]
    Receiver(#[from] bottex_core::TransportError),

    /// `run` was called before a root handler was set.
    #[error("No root handler set")]
    NoHandler,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
