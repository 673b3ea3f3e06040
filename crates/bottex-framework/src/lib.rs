//! # Bottex Framework
//!
//! The dispatch pipeline built on top of the core types.
//!
//! This layer provides:
//! - [`Handler`]: a cheaply cloneable, type-erased async request handler that
//!   is also a `tower::Service`
//! - [`Router`]: an ordered condition → handler table with a default, nestable
//! - [`View`]: a named conversation state with its own command router
//! - Middleware as `tower` layers ([`LoggingLayer`], [`UsersLayer`],
//!   [`FormatLayer`]) composed by the [`Dispatcher`]
//!
//! ```text
//! Request ─▶ LoggingLayer ─▶ UsersLayer ─▶ Router(state) ─▶ Router(view) ─▶ Command
//!                                                             │
//!                                      switch() ◀─────────────┘
//! ```

pub mod condition;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod router;
pub mod store;
pub mod users;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{Dispatcher, dispatch};
pub use error::ViewError;
pub use handler::{BoxError, BoxFuture, Direct, Handler, HandlerResult, IntoHandler, IntoReply, ViaFn};
pub use middleware::{FormatLayer, LoggingLayer, UsersLayer};
pub use router::{Condition, Route, Router};
pub use store::MemoryUserStore;
pub use users::gen_state_cases;
pub use view::{Command, CommandCache, CommandList, View, router};
