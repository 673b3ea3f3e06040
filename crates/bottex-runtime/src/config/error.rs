//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A source failed to parse or did not fit the schema.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// The values parsed but contradict each other.
    #[error("invalid configuration: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
