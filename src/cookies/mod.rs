//!
//! tubelink cookie layer
//! ---------------------
//! Request-scoped cookie plumbing shared by the session bridge and the route
//! handlers.
//!
//! - `RequestCookies` is the read side: an immutable, ordered snapshot of the
//!   `Cookie` headers that arrived with the request.
//! - `MutationSet` collects the `Set-Cookie` writes requested while a request
//!   is processed (last write for a name wins).
//! - `flush` applies a mutation set onto outgoing response headers.
//!
//! Cookie values are secrets. Nothing in this module logs a value.

mod attributes;
mod mutation;
mod reader;
mod writer;

pub use attributes::{CookieAttributes, SameSite, SESSION_MAX_AGE_SECS};
pub use mutation::{CookieMutation, MutationSet};
pub use reader::RequestCookies;
pub use writer::{flush, render_set_cookie};

/// Prefix used by the provider for every cookie it owns.
pub const SESSION_COOKIE_PREFIX: &str = "sb-";
/// Marker carried by session token cookies (and their chunks).
pub const SESSION_COOKIE_MARKER: &str = "auth-token";

/// Whether a cookie name belongs to the provider's session state.
pub fn is_session_cookie(name: &str) -> bool {
    name.starts_with(SESSION_COOKIE_PREFIX) || name.contains(SESSION_COOKIE_MARKER)
}

#[cfg(test)]
#[path = "cookies_tests.rs"]
mod cookies_tests;
