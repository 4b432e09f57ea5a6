//! Encoding of the provider session inside the `sb-<ref>-auth-token` cookie.
//!
//! The value is `base64-` followed by base64url (no padding) of the session
//! JSON; plain JSON and a bare access token are accepted on read. Values longer than `MAX_CHUNK_SIZE`
//! are spread over `<name>.0`, `<name>.1`, … cookies.

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::cookies::CookieAttributes;
use crate::identity::{CookieStorage, User};

pub const BASE64_PREFIX: &str = "base64-";
pub const MAX_CHUNK_SIZE: usize = 3180;

/// User object as the auth service returns it; only the fields used here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<ProviderUser> for User {
    fn from(u: ProviderUser) -> Self {
        User { id: u.id, email: u.email }
    }
}

/// Session as stored in the cookie and as returned by the token endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ProviderUser>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

pub fn encode(session: &StoredSession) -> Result<String> {
    let json = serde_json::to_vec(session).context("serialize session")?;
    Ok(format!("{}{}", BASE64_PREFIX, base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)))
}

impl StoredSession {
    /// Session known only by its access token, with no refresh token or expiry.
    pub fn bare(access_token: impl Into<String>) -> Self {
        StoredSession {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            expires_in: None,
            token_type: None,
            user: None,
        }
    }
}

fn is_bare_token(raw: &str) -> bool {
    !raw.is_empty() && !raw.starts_with('{') && raw.chars().all(|c| c.is_ascii_graphic())
}

pub fn decode(raw: &str) -> Result<StoredSession> {
    let json: Vec<u8> = match raw.strip_prefix(BASE64_PREFIX) {
        Some(b64) => base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(b64.trim_end_matches('='))
            .map_err(|e| anyhow!("session cookie is not valid base64: {}", e))?,
        None if is_bare_token(raw) => return Ok(StoredSession::bare(raw)),
        None => raw.as_bytes().to_vec(),
    };
    let session: StoredSession = serde_json::from_slice(&json).context("session cookie is not a session object")?;
    if session.access_token.is_empty() {
        return Err(anyhow!("session cookie carries an empty access token"));
    }
    Ok(session)
}

fn chunk_name(name: &str, idx: usize) -> String {
    format!("{}.{}", name, idx)
}

/// Split `value` into `(cookie name, part)` pairs. Short values stay in one cookie.
pub fn chunk(name: &str, value: &str) -> Vec<(String, String)> {
    if value.len() <= MAX_CHUNK_SIZE {
        return vec![(name.to_string(), value.to_string())];
    }
    let mut out = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut cut = rest.len().min(MAX_CHUNK_SIZE);
        while !rest.is_char_boundary(cut) { cut -= 1; }
        let (head, tail) = rest.split_at(cut);
        out.push((chunk_name(name, out.len()), head.to_string()));
        rest = tail;
    }
    out
}

/// Reassemble the session value. The unchunked cookie wins; otherwise chunks
/// are joined from `.0` up to the first missing index.
pub fn read_chunked(cookies: &dyn CookieStorage, name: &str) -> Option<String> {
    if let Some(v) = cookies.get(name).filter(|v| !v.is_empty()) {
        return Some(v);
    }
    let mut joined = String::new();
    let mut idx = 0usize;
    while let Some(part) = cookies.get(&chunk_name(name, idx)) {
        joined.push_str(&part);
        idx += 1;
    }
    if joined.is_empty() { None } else { Some(joined) }
}

/// Request cookies that belong to the session `name`: the cookie itself and its chunks.
pub fn session_cookie_names(cookies: &dyn CookieStorage, name: &str) -> Vec<String> {
    let chunk_prefix = format!("{}.", name);
    cookies
        .get_all()
        .into_iter()
        .map(|(n, _)| n)
        .filter(|n| n == name || n.strip_prefix(&chunk_prefix).map(|i| i.parse::<usize>().is_ok()).unwrap_or(false))
        .collect()
}

/// Stage `value` under `name`, removing whatever request cookies the new layout no longer uses.
pub fn write_session(cookies: &mut dyn CookieStorage, name: &str, value: &str, attributes: &CookieAttributes) {
    let parts = chunk(name, value);
    let existing = session_cookie_names(cookies, name);
    for (n, v) in &parts {
        cookies.set(n, v, attributes);
    }
    for stale in existing.iter().filter(|n| !parts.iter().any(|(p, _)| p == *n)) {
        cookies.remove(stale, attributes);
    }
}

/// Stage removal of the session cookie and every chunk present on the request.
pub fn clear_session(cookies: &mut dyn CookieStorage, name: &str, attributes: &CookieAttributes) {
    let mut names = session_cookie_names(cookies, name);
    if names.is_empty() {
        names.push(name.to_string());
    }
    for n in names {
        cookies.remove(&n, attributes);
    }
}

#[cfg(test)]
#[path = "session_cookie_tests.rs"]
mod session_cookie_tests;
