//! SQLite-backed [`UserStore`] for Bottex.
//!
//! Users live in a single table keyed by `(platform, external_id)`:
//!
//! ```text
//! users
//! ┌────┬──────────┬─────────────┬────────────┐
//! │ id │ platform │ external_id │ state      │
//! ├────┼──────────┼─────────────┼────────────┤
//! │  1 │ vk       │ 42          │ round_2    │
//! │  2 │ telegram │ 42          │ NULL       │
//! └────┴──────────┴─────────────┴────────────┘
//!          UNIQUE(platform, external_id)
//! ```
//!
//! Every operation runs in its own transaction on a blocking thread. The
//! connection sits behind a mutex, so writes are serialized.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bottex_core::{StoreError, StoreResult, User, UserStore, UserUpdate};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,
    external_id TEXT NOT NULL,
    state TEXT,
    UNIQUE (platform, external_id)
);
";

const SELECT_BY_KEY: &str =
    "SELECT id, platform, external_id, state FROM users WHERE platform = ?1 AND external_id = ?2";

const SELECT_BY_ID: &str = "SELECT id, platform, external_id, state FROM users WHERE id = ?1";

/// A [`UserStore`] persisted in a SQLite database.
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(backend)?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "SQLite user store opened");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory().map_err(backend)?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&mut conn.lock()))
            .await
            .map_err(|e| StoreError::Backend(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_or_create(&self, platform: &str, external_id: &str) -> StoreResult<User> {
        let platform = platform.to_string();
        let external_id = external_id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(backend)?;
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO users (platform, external_id) VALUES (?1, ?2)",
                    params![platform, external_id],
                )
                .map_err(backend)?;
            let user = tx
                .query_row(SELECT_BY_KEY, params![platform, external_id], row_to_user)
                .map_err(backend)?;
            tx.commit().map_err(backend)?;
            if inserted > 0 {
                debug!(id = user.id, platform = %user.platform, "User created");
            }
            Ok(user)
        })
        .await
    }

    async fn find(&self, platform: &str, external_id: &str) -> StoreResult<Option<User>> {
        let platform = platform.to_string();
        let external_id = external_id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(SELECT_BY_KEY, params![platform, external_id], row_to_user)
                .optional()
                .map_err(backend)
        })
        .await
    }

    async fn update(&self, id: i64, update: UserUpdate) -> StoreResult<User> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(backend)?;
            if let Some(state) = &update.state {
                let changed = tx
                    .execute("UPDATE users SET state = ?1 WHERE id = ?2", params![state, id])
                    .map_err(backend)?;
                if changed == 0 {
                    return Err(StoreError::NotFound { id });
                }
            }
            let user = tx
                .query_row(SELECT_BY_ID, params![id], row_to_user)
                .optional()
                .map_err(backend)?
                .ok_or(StoreError::NotFound { id })?;
            tx.commit().map_err(backend)?;
            Ok(user)
        })
        .await
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        platform: row.get(1)?,
        external_id: row.get(2)?,
        state: row.get(3)?,
    })
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
