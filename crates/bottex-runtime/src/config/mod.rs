//! Configuration module for the Bottex runtime.
//!
//! Configuration is layered with `figment`: built-in defaults, profile and
//! main configuration files, then `BOTTEX_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BottexConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
    StorageBackend, StorageConfig,
};
