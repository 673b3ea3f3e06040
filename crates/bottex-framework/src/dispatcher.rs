//! Pipeline assembly.
//!
//! The [`Dispatcher`] collects the root handler and the middleware layers and
//! [`build`](Dispatcher::build)s them into a single [`Handler`]. Layers are
//! applied so that the first registered layer is the outermost one:
//!
//! ```text
//! add_middleware(L); add_middleware(R); set_handler(root)
//!
//! build() == L(R(root))
//! ```
//!
//! [`dispatch`] runs one request through a built pipeline and is the only
//! place handler errors are turned into log lines.

use std::sync::Arc;

use bottex_core::{Reply, Request};
use tower::{Layer, Service};
use tracing::{Instrument, error, info_span, trace};

use crate::handler::{BoxError, Handler, IntoHandler};

type LayerFn = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Root handler plus middleware, in registration order.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handler: Option<Handler>,
    layers: Vec<LayerFn>,
}

impl Dispatcher {
    /// Creates a dispatcher with no handler and no middleware.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root handler, replacing any previous one.
    pub fn set_handler<H, M>(&mut self, handler: H)
    where
        H: IntoHandler<M>,
    {
        self.handler = Some(handler.into_handler());
    }

    /// Registers a middleware layer. Earlier layers wrap later ones.
    pub fn add_middleware<L>(&mut self, layer: L)
    where
        L: Layer<Handler> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Reply, Error = BoxError> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers
            .push(Arc::new(move |inner: Handler| Handler::from_service(layer.layer(inner))));
    }

    /// Returns `true` if a root handler is set.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Returns the number of registered layers.
    pub fn middleware_count(&self) -> usize {
        self.layers.len()
    }

    /// Builds the layered pipeline, or `None` without a root handler.
    pub fn build(&self) -> Option<Handler> {
        let root = self.handler.clone()?;
        Some(self.layers.iter().rev().fold(root, |inner, layer| layer(inner)))
    }
}

/// Runs one request through `handler`.
///
/// Handler errors are logged and the request is dropped: `None` means no
/// reply was produced.
pub async fn dispatch(handler: &Handler, request: Request) -> Option<Reply> {
    let span = info_span!(
        "dispatch",
        platform = request.platform(),
        sender = request.sender_id().unwrap_or("-"),
    );

    async move {
        match handler.call(request).await {
            Ok(reply) => {
                trace!(?reply, "Request handled");
                Some(reply)
            }
            Err(e) => {
                error!(error = %e, "Handler failed, dropping request");
                None
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{FormatLayer, INVISIBLE_SPACE, LoggingLayer, UsersLayer};
    use crate::store::MemoryUserStore;
    use crate::testing::{RecordingChat, request};
    use async_trait::async_trait;
    use bottex_core::{BoxedChat, Chat, Keyboard, UserStore};
    use parking_lot::Mutex;
    use std::task::{Context, Poll};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records `"<name> in"` on the way in and `"<name> out"` at send time.
    #[derive(Clone)]
    struct TraceLayer {
        name: &'static str,
        log: Log,
    }

    #[derive(Clone)]
    struct TraceService {
        name: &'static str,
        log: Log,
        inner: Handler,
    }

    struct TraceChat {
        name: &'static str,
        log: Log,
        inner: BoxedChat,
    }

    impl Layer<Handler> for TraceLayer {
        type Service = TraceService;

        fn layer(&self, inner: Handler) -> TraceService {
            TraceService {
                name: self.name,
                log: self.log.clone(),
                inner,
            }
        }
    }

    impl Service<Request> for TraceService {
        type Response = Reply;
        type Error = BoxError;
        type Future = crate::handler::BoxFuture<'static, crate::handler::HandlerResult>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request) -> Self::Future {
            self.log.lock().push(format!("{} in", self.name));
            let (name, log) = (self.name, self.log.clone());
            let request = request.map_chat(|inner| Box::new(TraceChat { name, log, inner }));
            self.inner.call(request)
        }
    }

    #[async_trait]
    impl Chat for TraceChat {
        async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
            self.log.lock().push(format!("{} out", self.name));
            self.inner.send(text, keyboard).await
        }
    }

    #[tokio::test]
    async fn test_middleware_order() {
        let log: Log = Arc::default();
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(TraceLayer { name: "L", log: log.clone() });
        dispatcher.add_middleware(TraceLayer { name: "R", log: log.clone() });
        let handler_log = log.clone();
        dispatcher.set_handler(move |req: Request| {
            handler_log.lock().push("handler".into());
            async move { req.reply("hi").await }
        });

        let pipeline = dispatcher.build().unwrap();
        let (chat, sent) = RecordingChat::new();
        let reply = dispatch(&pipeline, request("x", chat)).await;

        assert_eq!(reply, Some(Reply::Sent));
        assert_eq!(sent.texts(), vec!["hi"]);
        assert_eq!(*log.lock(), vec!["L in", "R in", "handler", "R out", "L out"]);
    }

    #[tokio::test]
    async fn test_handler_error_drops_request() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.set_handler(|_req: Request| async { Err::<Reply, _>("broken handler") });

        let (chat, sent) = RecordingChat::new();
        let reply = dispatch(&dispatcher.build().unwrap(), request("x", chat)).await;

        assert_eq!(reply, None);
        assert!(sent.texts().is_empty());
    }

    #[test]
    fn test_build_without_handler() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(LoggingLayer::new());
        assert!(dispatcher.build().is_none());
        assert_eq!(dispatcher.middleware_count(), 1);
    }

    #[tokio::test]
    async fn test_builtin_layers() {
        let store = Arc::new(MemoryUserStore::new());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(LoggingLayer::new());
        dispatcher.add_middleware(UsersLayer::new(store.clone()));
        dispatcher.add_middleware(FormatLayer::default());
        dispatcher.set_handler(|req: Request| async move {
            let id = req.user().map(|u| u.id()).unwrap_or_default();
            req.reply(&format!("user {id}")).await;
            req.reply("   ").await
        });

        let pipeline = dispatcher.build().unwrap();
        let (chat, sent) = RecordingChat::new();
        dispatch(&pipeline, request("x", chat)).await;
        let (chat, _) = RecordingChat::new();
        dispatch(&pipeline, request("y", chat)).await;

        assert_eq!(sent.texts(), vec!["user 1".to_string(), INVISIBLE_SPACE.to_string()]);
        assert_eq!(store.len(), 1);
        assert!(store.find("test", "1").await.unwrap().is_some());
    }
}
