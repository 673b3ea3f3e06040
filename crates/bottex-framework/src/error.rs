//! Error types for the Bottex framework.
//!
//! Handlers fail with a boxed error ([`BoxError`](crate::handler::BoxError));
//! the types here are the concrete errors the framework itself raises.

use thiserror::Error;

/// Errors raised while entering or running a view.
#[derive(Debug, Clone, Error)]
pub enum ViewError {
    /// `switch` was called on a request without a resolved user.
    ///
    /// Usually means `UsersLayer` is missing from the middleware chain or the
    /// platform event had no sender.
    #[error("cannot switch state: request from '{platform}' has no user")]
    MissingUser {
        /// Platform of the offending request.
        platform: &'static str,
    },
}
