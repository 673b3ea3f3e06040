//! In-memory user store.

use std::collections::HashMap;

use async_trait::async_trait;
use bottex_core::{StoreError, StoreResult, User, UserStore, UserUpdate};
use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    next_id: i64,
    ids: HashMap<(String, String), i64>,
    users: HashMap<i64, User>,
}

/// A [`UserStore`] kept in process memory.
///
/// A single lock serializes all writes. Suitable for tests and for bots that
/// can afford to forget their users on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> usize {
        self.inner.lock().users.len()
    }

    /// Returns `true` if no user has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_or_create(&self, platform: &str, external_id: &str) -> StoreResult<User> {
        let mut inner = self.inner.lock();
        let key = (platform.to_string(), external_id.to_string());
        if let Some(user) = inner.ids.get(&key).and_then(|id| inner.users.get(id)) {
            return Ok(user.clone());
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            platform: key.0.clone(),
            external_id: key.1.clone(),
            state: None,
        };
        inner.ids.insert(key, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find(&self, platform: &str, external_id: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock();
        let key = (platform.to_string(), external_id.to_string());
        Ok(inner.ids.get(&key).and_then(|id| inner.users.get(id)).cloned())
    }

    async fn update(&self, id: i64, update: UserUpdate) -> StoreResult<User> {
        let mut inner = self.inner.lock();
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        update.apply(user);
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryUserStore::new();
        let first = store.get_or_create("vk", "42").await.unwrap();
        let second = store.get_or_create("vk", "42").await.unwrap();
        let other = store.get_or_create("telegram", "42").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first.id, other.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryUserStore::new();
        let err = store.update(7, UserUpdate::state("A")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 7 }));
    }
}
