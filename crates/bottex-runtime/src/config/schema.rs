//! Configuration schema definitions.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "pretty"
//! filters = { bottex_framework = "trace" }
//!
//! [receivers.telegram]
//! token = "123:abc"
//!
//! [receivers.vk]
//! token = "vk1.a.xyz"
//! group_id = 1234
//!
//! [storage]
//! backend = "sqlite"
//! path = "ideal_man.db"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use figment::value::Value;
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BottexConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-receiver sections, keyed by receiver name. Each section is
    /// deserialized by the receiver that claims it.
    #[serde(default)]
    pub receivers: HashMap<String, Value>,

    /// User storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl BottexConfig {
    /// Checks cross-field constraints the types cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some((name, _)) = self
            .receivers
            .iter()
            .find(|(_, section)| !matches!(section, Value::Dict(..)))
        {
            return Err(ConfigError::validation(format!(
                "receivers.{name} must be a table"
            )));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "storage.path must be set for the sqlite backend",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Daily,
    Hourly,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module levels, e.g. `bottex_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

// =============================================================================
// Storage
// =============================================================================

/// Where users and their conversation state are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In process memory; lost on restart.
    #[default]
    Memory,
    /// A SQLite database file.
    Sqlite,
}

/// User storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database path for file-backed stores.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("bottex.db")
}
