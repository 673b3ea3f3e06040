//! Inbound/outbound text logging.

use std::task::{Context, Poll};

use async_trait::async_trait;
use bottex_core::{BoxedChat, Chat, Keyboard, Reply, Request};
use tower::{Layer, Service};
use tracing::info;

use crate::handler::{BoxError, BoxFuture, HandlerResult};

/// Logs every inbound text before dispatch and every outbound text at send time.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingLayer;

impl LoggingLayer {
    /// Creates the layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService { inner }
    }
}

#[derive(Clone)]
pub struct LoggingService<S> {
    inner: S,
}

impl<S> Service<Request> for LoggingService<S>
where
    S: Service<Request, Response = Reply, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Reply;
    type Error = BoxError;
    type Future = BoxFuture<'static, HandlerResult>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        info!(platform = request.platform(), "in : {:?}", request.text);
        let platform = request.platform();
        let request = request.map_chat(|chat| Box::new(LoggingChat::new(platform, chat)));

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}

/// Logs outbound text, then forwards to the wrapped chat.
pub struct LoggingChat {
    platform: &'static str,
    inner: BoxedChat,
}

impl LoggingChat {
    /// Wraps `inner`.
    pub fn new(platform: &'static str, inner: BoxedChat) -> Self {
        Self { platform, inner }
    }
}

#[async_trait]
impl Chat for LoggingChat {
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
        info!(platform = self.platform, "out: {:?}", text);
        self.inner.send(text, keyboard).await
    }
}
