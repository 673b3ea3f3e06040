//! Handler system for the Bottex framework.
//!
//! A [`Handler`] is the unit every part of the pipeline agrees on: command
//! callbacks, view defaults, routers and fully layered middleware stacks are
//! all handlers. It is an `Arc` around a type-erased async function, so
//! cloning is cheap and it can be stored in route tables.
//!
//! Anything implementing [`IntoHandler`] can be used where a handler is
//! expected:
//!
//! ```rust,ignore
//! // An async closure returning anything that implements `IntoReply`
//! router.add_route(text_eq("ping"), |req: Request| async move {
//!     req.reply("pong").await
//! });
//!
//! // A nested router
//! outer.add_route(in_state("Menu"), menu_router);
//! ```
//!
//! # Tower Integration
//!
//! `Handler` implements `tower::Service<Request>`, and any cloneable service
//! with the same signature converts back with [`Handler::from_service`]. This
//! is how middleware layers are applied.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bottex_core::{Reply, Request};
use futures::FutureExt;
use tower::{Service, ServiceExt};

pub use tower::BoxError;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every handler resolves to.
pub type HandlerResult = Result<Reply, BoxError>;

type HandlerFn = dyn Fn(Request) -> BoxFuture<'static, HandlerResult> + Send + Sync;

// ============================================================================
// IntoReply
// ============================================================================

/// Values a handler may return.
pub trait IntoReply {
    /// Converts the value into a handler result.
    fn into_reply(self) -> HandlerResult;
}

impl IntoReply for Reply {
    fn into_reply(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> HandlerResult {
        Ok(Reply::NoReply)
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> HandlerResult {
        self.map_err(Into::into).and_then(IntoReply::into_reply)
    }
}

// ============================================================================
// Handler
// ============================================================================

/// A cheaply cloneable, type-erased async request handler.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wraps an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoReply,
    {
        Self {
            inner: Arc::new(move |request| f(request).map(IntoReply::into_reply).boxed()),
        }
    }

    /// Wraps a tower service. The service is cloned for every call.
    pub fn from_service<S>(service: S) -> Self
    where
        S: Service<Request, Response = Reply, Error = BoxError> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        Self {
            inner: Arc::new(move |request| service.clone().oneshot(request).boxed()),
        }
    }

    /// Handles one request.
    pub fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        (self.inner)(request)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Service<Request> for Handler {
    type Response = Reply;
    type Error = BoxError;
    type Future = BoxFuture<'static, HandlerResult>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        Handler::call(self, request)
    }
}

// ============================================================================
// IntoHandler
// ============================================================================

/// Conversion into a [`Handler`].
///
/// The marker `M` only keeps the blanket implementations apart; it is always
/// inferred.
pub trait IntoHandler<M>: Send + Sync + 'static {
    /// Performs the conversion.
    fn into_handler(self) -> Handler;
}

/// Marker for async functions.
pub struct ViaFn<Fut>(PhantomData<fn() -> Fut>);

/// Marker for values that already are, or directly produce, a handler.
pub struct Direct;

impl<F, Fut> IntoHandler<ViaFn<Fut>> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn into_handler(self) -> Handler {
        Handler::new(self)
    }
}

impl IntoHandler<Direct> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingChat, request};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_closure_handler() {
        let (chat, sent) = RecordingChat::new();
        let handler = Handler::new(|req: Request| async move { req.reply(&req.text).await });

        let reply = handler.call(request("echo", chat)).await.unwrap();

        assert_eq!(reply, Reply::Sent);
        assert_eq!(sent.texts(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_unit_and_error_returns() {
        let (chat, _) = RecordingChat::new();
        let unit = Handler::new(|_req: Request| async {});
        assert_eq!(unit.call(request("x", chat)).await.unwrap(), Reply::NoReply);

        let (chat, _) = RecordingChat::new();
        let failing = Handler::new(|_req: Request| async { Err::<Reply, _>("boom") });
        let err = failing.call(request("x", chat)).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_service_round_trip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Handler::new(move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Reply::NoReply }
        });

        let wrapped = Handler::from_service(inner);
        let (chat, _) = RecordingChat::new();
        wrapped.call(request("x", chat)).await.unwrap();

        let (chat, _) = RecordingChat::new();
        let mut svc = wrapped.clone();
        svc.ready().await.unwrap().call(request("y", chat)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
