//! Unified error types for the Bottex core.
//!
//! Handler-level errors are boxed (`tower::BoxError`) in the framework crate;
//! the types here describe the two collaborator boundaries the core talks to.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised by a platform transport (polling or sending).
///
/// All variants are transient: receivers and chats log them and carry on.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request did not complete within the platform timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The platform API rejected the call.
    #[error("platform API error ({code}): {message}")]
    Api {
        /// Platform error code.
        code: i64,
        /// Platform error description.
        message: String,
    },

    /// The platform answered with something we could not decode.
    #[error("failed to decode platform response: {0}")]
    Decode(String),

    /// Invalid transport configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by a [`UserStore`](crate::user::UserStore).
///
/// These are programming or infrastructure errors and are never retried.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No user with the given id exists.
    #[error("user {id} not found")]
    NotFound {
        /// The missing user id.
        id: i64,
    },

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for user store operations.
pub type StoreResult<T> = Result<T, StoreError>;
