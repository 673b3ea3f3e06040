//! State-keyed routing.
//!
//! [`gen_state_cases`] turns a set of views into the outer routing table of
//! the two-level state machine: one route per view, taken when the user's
//! persisted state equals the view's name, leading into that view's command
//! router. Users with no state, or with a state no view claims, fall through
//! to the outer router's default.

use std::sync::Arc;

use crate::condition::in_state;
use crate::router::Route;
use crate::view::{View, router};

/// Builds one route per view, keyed on the persisted state name.
pub fn gen_state_cases<I>(views: I) -> Vec<Route>
where
    I: IntoIterator<Item = Arc<dyn View>>,
{
    views
        .into_iter()
        .map(|view| Route::new(in_state(view.name()), router(view)))
        .collect()
}
