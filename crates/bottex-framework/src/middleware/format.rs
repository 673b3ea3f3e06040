//! Outbound text formatting.

use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bottex_core::{BoxedChat, Chat, Keyboard, Reply, Request};
use tower::{Layer, Service};

use crate::handler::{BoxError, BoxFuture, HandlerResult};

/// Zero-width space. Platforms reject empty messages, so blank text is
/// replaced with this by the default formatter.
pub const INVISIBLE_SPACE: &str = "\u{200b}";

type Formatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Rewrites every outbound text with a formatter function.
#[derive(Clone)]
pub struct FormatLayer {
    formatter: Formatter,
}

impl FormatLayer {
    /// Creates the layer with a custom formatter.
    pub fn new<F>(formatter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            formatter: Arc::new(formatter),
        }
    }
}

impl Default for FormatLayer {
    /// Replaces blank messages with [`INVISIBLE_SPACE`].
    fn default() -> Self {
        Self::new(|text| {
            if text.trim().is_empty() {
                INVISIBLE_SPACE.to_string()
            } else {
                text.to_string()
            }
        })
    }
}

impl<S> Layer<S> for FormatLayer {
    type Service = FormatService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FormatService {
            inner,
            formatter: Arc::clone(&self.formatter),
        }
    }
}

#[derive(Clone)]
pub struct FormatService<S> {
    inner: S,
    formatter: Formatter,
}

impl<S> Service<Request> for FormatService<S>
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
        let formatter = Arc::clone(&self.formatter);
        let request = request.map_chat(|chat| Box::new(FormattingChat { inner: chat, formatter }));

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}

/// Formats outbound text, then forwards to the wrapped chat.
pub struct FormattingChat {
    inner: BoxedChat,
    formatter: Formatter,
}

#[async_trait]
impl Chat for FormattingChat {
    async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> Reply {
        let text = (self.formatter)(text);
        self.inner.send(&text, keyboard).await
    }
}
