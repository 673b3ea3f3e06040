//! Views: named conversation states.
//!
//! A [`View`] owns a [`CommandList`] and a default handler. Entering a view
//! ([`View::switch`]) persists its name as the user's state and sends its
//! prompt; while the user stays in it, [`router`] matches incoming text
//! against the view's commands.
//!
//! # Command Matching
//!
//! Commands are numbered from 1 in declaration order (rows flattened). For
//! every command two routes are added, in this order:
//!
//! 1. the trimmed text equals the command's number
//! 2. the text contains the command's label, ignoring case
//!
//! The first matching route wins; unmatched text goes to [`View::default`].
//!
//! ```text
//! "2"           ─▶ index route of command 2
//! "go to BAR"   ─▶ label route of "Go to bar"
//! "what?"       ─▶ default (state unchanged)
//! ```
//!
//! There is no transition table: a command handler moves the conversation by
//! calling another view's `switch`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use bottex_core::{Keyboard, Reply, Request, UserUpdate};
use parking_lot::RwLock;
use tracing::debug;

use crate::condition::{contains, text_eq};
use crate::error::ViewError;
use crate::handler::{Handler, HandlerResult, IntoHandler};
use crate::router::Router;

// ============================================================================
// Commands
// ============================================================================

/// A selectable option: a label and the handler it triggers.
#[derive(Clone)]
pub struct Command {
    text: String,
    handler: Handler,
}

impl Command {
    /// Creates a command.
    pub fn new<H, M>(text: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<M>,
    {
        Self {
            text: text.into(),
            handler: handler.into_handler(),
        }
    }

    /// Returns the label.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Command").field(&self.text).finish()
    }
}

/// Rows of commands, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct CommandList {
    rows: Vec<Vec<Command>>,
}

impl CommandList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command on its own row.
    pub fn add<H, M>(&mut self, text: impl Into<String>, handler: H)
    where
        H: IntoHandler<M>,
    {
        self.rows.push(vec![Command::new(text, handler)]);
    }

    /// Adds a row of commands.
    pub fn push_row(&mut self, row: Vec<Command>) {
        self.rows.push(row);
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Vec<Command>] {
        &self.rows
    }

    /// Iterates over all commands with their 1-based number.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Command)> {
        self.rows.iter().flatten().enumerate().map(|(i, c)| (i + 1, c))
    }

    /// Returns the number of commands.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Returns `true` if there are no commands.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the commands as `"1. label"` lines.
    pub fn enumerate(&self) -> String {
        self.iter()
            .map(|(i, c)| format!("{i}. {}", c.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds a keyboard with one button per command, keeping the rows.
    pub fn keyboard(&self) -> Keyboard {
        self.rows.iter().fold(Keyboard::new(), |kb, row| {
            kb.row(row.iter().map(|c| c.text.clone()))
        })
    }
}

/// Memoizes one [`CommandList`] per view.
///
/// Lists are built at most once per key in the common case; when two threads
/// race, both build and the first insert wins.
pub struct CommandCache<K> {
    lists: RwLock<HashMap<K, Arc<CommandList>>>,
}

impl<K> Default for CommandCache<K> {
    fn default() -> Self {
        Self {
            lists: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Hash + Eq + Clone> CommandCache<K> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the list for `key`, building it with `build` on first use.
    pub fn get_or_init<F>(&self, key: &K, build: F) -> Arc<CommandList>
    where
        F: FnOnce() -> CommandList,
    {
        if let Some(list) = self.lists.read().get(key) {
            return Arc::clone(list);
        }
        let built = Arc::new(build());
        Arc::clone(self.lists.write().entry(key.clone()).or_insert(built))
    }
}

// ============================================================================
// View
// ============================================================================

/// A named conversation state.
#[async_trait]
pub trait View: Send + Sync + 'static {
    /// State name persisted for users in this view. Unique per dispatcher.
    fn name(&self) -> &'static str;

    /// The view's commands. Implementations should memoize the list.
    fn commands(&self) -> Arc<CommandList>;

    /// Keyboard sent with the prompt and the fallback message.
    fn keyboard(&self) -> Keyboard {
        Keyboard::new()
    }

    /// Message sent on entering the view. `None` enters silently.
    fn prompt(&self, _commands: &CommandList) -> Option<String> {
        None
    }

    /// Handles text that matched no command. Must not change state.
    async fn default(&self, request: &Request) -> HandlerResult;

    /// Enters the view: persists the state, then sends the prompt.
    async fn switch(&self, request: &Request) -> HandlerResult {
        let user = request.user().ok_or(ViewError::MissingUser {
            platform: request.platform(),
        })?;
        user.update(UserUpdate::state(self.name())).await?;
        debug!(user = user.id(), state = self.name(), "Switched state");

        let commands = self.commands();
        match self.prompt(&commands) {
            Some(text) => Ok(request.reply_with(&text, &self.keyboard()).await),
            None => Ok(Reply::NoReply),
        }
    }
}

/// Builds the command router of a view.
pub fn router(view: Arc<dyn View>) -> Router {
    let fallback = Arc::clone(&view);
    let mut router = Router::new(move |request: Request| {
        let view = Arc::clone(&fallback);
        async move { view.default(&request).await }
    })
    .name(view.name());

    for (index, command) in view.commands().iter() {
        router.add_route(text_eq(index.to_string()), command.handler.clone());
        router.add_route(contains(command.text.as_str()), command.handler.clone());
    }
    router
}
