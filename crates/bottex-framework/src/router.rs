//! Ordered condition → handler routing.
//!
//! A [`Router`] holds a table of [`Route`]s and one default handler.
//! [`Router::dispatch`] evaluates the conditions in insertion order and runs
//! the handler of the first one that holds; when none does, the default runs.
//! There is no backtracking and no de-duplication: a route shadowed by an
//! earlier, broader condition is simply never reached.
//!
//! A router is itself a handler, so routers nest:
//!
//! ```rust,ignore
//! let menu = Router::new(menu_fallback)
//!     .route(text_eq("1"), open_settings)
//!     .route(contains("help"), show_help);
//!
//! let root = Router::new(greet).route(in_state("Menu"), menu);
//! ```

use std::sync::Arc;

use bottex_core::Request;
use tracing::trace;

use crate::handler::{Direct, Handler, HandlerResult, IntoHandler};

/// A type-erased route condition.
pub type Condition = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// One entry of a routing table.
#[derive(Clone)]
pub struct Route {
    condition: Condition,
    handler: Handler,
}

impl Route {
    /// Creates a route.
    pub fn new<C, H, M>(condition: C, handler: H) -> Self
    where
        C: Fn(&Request) -> bool + Send + Sync + 'static,
        H: IntoHandler<M>,
    {
        Self {
            condition: Arc::new(condition),
            handler: handler.into_handler(),
        }
    }

    /// Returns `true` if the route accepts the request.
    pub fn matches(&self, request: &Request) -> bool {
        (self.condition)(request)
    }

    /// Returns the route's handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Internal data for a Router.
///
/// Implements `Clone` to support `Arc::make_mut` for copy-on-write semantics.
#[derive(Clone)]
struct RouterInner {
    name: Option<String>,
    routes: Vec<Route>,
    default: Handler,
}

/// An ordered routing table with a default handler.
///
/// `Router` uses an internal `Arc`, so cloning it is cheap; mutating a clone
/// copies the table first.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Creates an empty router that sends everything to `default`.
    pub fn new<H, M>(default: H) -> Self
    where
        H: IntoHandler<M>,
    {
        Self::from_routes(Vec::new(), default)
    }

    /// Creates a router from a prepared table.
    pub fn from_routes<H, M>(routes: impl IntoIterator<Item = Route>, default: H) -> Self
    where
        H: IntoHandler<M>,
    {
        Self {
            inner: Arc::new(RouterInner {
                name: None,
                routes: routes.into_iter().collect(),
                default: default.into_handler(),
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut RouterInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Sets a name for this router (used in logs).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner_mut().name = Some(name.into());
        self
    }

    /// Appends a route.
    pub fn add_route<C, H, M>(&mut self, condition: C, handler: H)
    where
        C: Fn(&Request) -> bool + Send + Sync + 'static,
        H: IntoHandler<M>,
    {
        self.inner_mut().routes.push(Route::new(condition, handler));
    }

    /// Appends a route (builder pattern).
    pub fn route<C, H, M>(mut self, condition: C, handler: H) -> Self
    where
        C: Fn(&Request) -> bool + Send + Sync + 'static,
        H: IntoHandler<M>,
    {
        self.add_route(condition, handler);
        self
    }

    /// Appends a prepared route.
    pub fn push(&mut self, route: Route) {
        self.inner_mut().routes.push(route);
    }

    /// Returns the number of routes, excluding the default.
    pub fn route_count(&self) -> usize {
        self.inner.routes.len()
    }

    /// Selects the handler for `request` without running it.
    pub fn select(&self, request: &Request) -> &Handler {
        for (index, route) in self.inner.routes.iter().enumerate() {
            if route.matches(request) {
                trace!(router = ?self.inner.name, index, "Route matched");
                return &route.handler;
            }
        }
        trace!(router = ?self.inner.name, "No route matched, using default");
        &self.inner.default
    }

    /// Routes the request to the first matching handler, or the default.
    pub async fn dispatch(&self, request: Request) -> HandlerResult {
        let handler = self.select(&request).clone();
        handler.call(request).await
    }
}

impl IntoHandler<Direct> for Router {
    fn into_handler(self) -> Handler {
        Handler::new(move |request: Request| {
            let router = self.clone();
            async move { router.dispatch(request).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingChat, request};
    use bottex_core::Reply;

    fn say(text: &'static str) -> Handler {
        Handler::new(move |req: Request| async move { req.reply(text).await })
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let router = Router::new(say("default"))
            .route(|r: &Request| r.text.contains('a'), say("first"))
            .route(|r: &Request| r.text.contains("ab"), say("second"));

        let (chat, sent) = RecordingChat::new();
        router.dispatch(request("ab", chat)).await.unwrap();
        assert_eq!(sent.texts(), vec!["first"]);
        assert_eq!(router.route_count(), 2);
    }

    #[tokio::test]
    async fn test_default_fires_when_nothing_matches() {
        let router = Router::new(say("default")).route(|_: &Request| false, say("never"));

        let (chat, sent) = RecordingChat::new();
        let reply = router.dispatch(request("zzz", chat)).await.unwrap();
        assert_eq!(reply, Reply::Sent);
        assert_eq!(sent.texts(), vec!["default"]);
    }

    #[test]
    fn test_nested_router() {
        let inner = Router::new(say("inner default")).route(|r: &Request| r.text == "x", say("inner x"));
        let outer = Router::new(say("outer default")).route(|r: &Request| r.text.len() == 1, inner);

        let (chat, sent) = RecordingChat::new();
        tokio_test::block_on(outer.dispatch(request("x", chat))).unwrap();
        let (chat2, sent2) = RecordingChat::new();
        tokio_test::block_on(outer.dispatch(request("y", chat2))).unwrap();

        assert_eq!(sent.texts(), vec!["inner x"]);
        assert_eq!(sent2.texts(), vec!["inner default"]);
    }

    #[tokio::test]
    async fn test_clone_is_copy_on_write() {
        let base = Router::new(say("default"));
        let mut extended = base.clone();
        extended.add_route(|_: &Request| true, say("always"));

        assert_eq!(base.route_count(), 0);
        assert_eq!(extended.route_count(), 1);
    }
}
