//! Ready-made route conditions.
//!
//! Each function returns a closure usable with [`Router::add_route`](crate::Router::add_route).

use bottex_core::Request;

/// Matches when the text contains `needle`, ignoring case.
pub fn contains(needle: impl Into<String>) -> impl Fn(&Request) -> bool + Send + Sync + Clone + 'static {
    let needle = needle.into().to_lowercase();
    move |request: &Request| request.text.to_lowercase().contains(&needle)
}

/// Matches when the trimmed text equals `expected` exactly.
pub fn text_eq(expected: impl Into<String>) -> impl Fn(&Request) -> bool + Send + Sync + Clone + 'static {
    let expected = expected.into();
    move |request: &Request| request.text.trim() == expected
}

/// Matches when the request's user is in the state called `name`.
///
/// Requests without a resolved user never match.
pub fn in_state(name: impl Into<String>) -> impl Fn(&Request) -> bool + Send + Sync + Clone + 'static {
    let name = name.into();
    move |request: &Request| {
        request
            .user()
            .and_then(|user| user.state())
            .is_some_and(|state| state == name)
    }
}

/// Matches every request.
pub fn always() -> impl Fn(&Request) -> bool + Send + Sync + Clone + 'static {
    |_: &Request| true
}
