//! Persisted users and their conversation state.
//!
//! The core never owns persistence. It talks to a [`UserStore`] and keeps the
//! per-request view of a user in a [`UserHandle`], which writes updates
//! through to the store and refreshes its snapshot with the stored result.
//!
//! Updates are explicit: a [`UserUpdate`] names every field that may change,
//! so an unknown field is a compile error rather than a runtime one.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A persisted chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned id.
    pub id: i64,
    /// Platform name.
    pub platform: String,
    /// The platform's identifier of the user.
    pub external_id: String,
    /// Name of the current conversation state; `None` until the first switch.
    pub state: Option<String>,
}

/// A typed partial update of a [`User`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// New conversation state name.
    pub state: Option<String>,
}

impl UserUpdate {
    /// An update that sets the conversation state.
    pub fn state(name: impl Into<String>) -> Self {
        Self {
            state: Some(name.into()),
        }
    }

    /// Returns `true` if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
    }

    /// Applies the update to a user in place.
    pub fn apply(&self, user: &mut User) {
        if let Some(state) = &self.state {
            user.state = Some(state.clone());
        }
    }
}

/// Persistence collaborator for users.
///
/// Implementations must serialize conflicting writes themselves; the
/// dispatcher calls these concurrently for different users.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Returns the user for `(platform, external_id)`, creating it with no
    /// state if it does not exist yet. Idempotent.
    async fn get_or_create(&self, platform: &str, external_id: &str) -> StoreResult<User>;

    /// Looks a user up without creating it.
    ///
    /// Dispatch never calls this; it is the read-only hook for tooling and
    /// tests that inspect persisted state without registering new users.
    async fn find(&self, platform: &str, external_id: &str) -> StoreResult<Option<User>>;

    /// Applies `update` to the user with `id` and returns the stored result.
    async fn update(&self, id: i64, update: UserUpdate) -> StoreResult<User>;
}

/// The user attached to one request.
#[derive(Clone)]
pub struct UserHandle {
    store: Arc<dyn UserStore>,
    user: Arc<RwLock<User>>,
}

impl UserHandle {
    /// Wraps a loaded user together with the store it came from.
    pub fn new(store: Arc<dyn UserStore>, user: User) -> Self {
        Self {
            store,
            user: Arc::new(RwLock::new(user)),
        }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> User {
        self.user.read().clone()
    }

    /// Returns the store-assigned id.
    pub fn id(&self) -> i64 {
        self.user.read().id
    }

    /// Returns the current conversation state name.
    pub fn state(&self) -> Option<String> {
        self.user.read().state.clone()
    }

    /// Persists `update` and refreshes the snapshot.
    pub async fn update(&self, update: UserUpdate) -> StoreResult<User> {
        let id = self.id();
        let stored = self.store.update(id, update).await?;
        *self.user.write() = stored.clone();
        Ok(stored)
    }
}

impl std::fmt::Debug for UserHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UserHandle").field(&*self.user.read()).finish()
    }
}
