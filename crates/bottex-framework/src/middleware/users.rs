//! User resolution.

use std::sync::Arc;
use std::task::{Context, Poll};

use bottex_core::{Reply, Request, UserHandle, UserStore};
use tower::{Layer, Service};
use tracing::trace;

use crate::handler::{BoxError, BoxFuture, HandlerResult};

/// Resolves the sender to a persisted user and attaches it to the request.
///
/// The user is looked up, or created on first contact, by
/// `(platform, sender_id)`. Requests without a sender id pass through with no
/// user. Store failures abort the request.
#[derive(Clone)]
pub struct UsersLayer {
    store: Arc<dyn UserStore>,
}

impl UsersLayer {
    /// Creates the layer over `store`.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for UsersLayer {
    type Service = UsersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UsersService {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}

#[derive(Clone)]
pub struct UsersService<S> {
    inner: S,
    store: Arc<dyn UserStore>,
}

impl<S> Service<Request> for UsersService<S>
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
        let store = Arc::clone(&self.store);
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let request = match request.sender_id().map(str::to_owned) {
                Some(sender_id) => {
                    let user = store.get_or_create(request.platform(), &sender_id).await?;
                    trace!(user = user.id, state = ?user.state, "Resolved user");
                    request.with_user(UserHandle::new(store, user))
                }
                None => {
                    trace!(platform = request.platform(), "Request has no sender");
                    request
                }
            };
            inner.call(request).await
        })
    }
}
