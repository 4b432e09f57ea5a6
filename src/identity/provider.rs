use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cookies::{is_session_cookie, CookieAttributes};
use crate::tprintln;

use super::principal::User;
use super::session::Session;

/// Cookie access handed to an auth provider for one request.
///
/// Reads see the request as it arrived. Writes are staged for the response and
/// never fail from the provider's point of view.
pub trait CookieStorage: Send {
    fn get(&self, name: &str) -> Option<String>;
    fn get_all(&self) -> Vec<(String, String)>;
    fn set(&mut self, name: &str, value: &str, attributes: &CookieAttributes);
    fn remove(&mut self, name: &str, attributes: &CookieAttributes);
}

/// The external authentication service, seen through per-request cookies.
///
/// Implementations hold no per-request state; everything request-scoped
/// arrives through `cookies`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Name of the cookie carrying the session token.
    fn session_cookie_name(&self) -> &str;

    /// Validate (and possibly refresh) the session found in `cookies`.
    /// `Ok(None)` means no usable session; `Err` means validation itself failed.
    async fn get_session(&self, cookies: &mut dyn CookieStorage) -> Result<Option<Session>>;

    /// End `session` upstream and stage removal of every session cookie.
    async fn sign_out(&self, session: &Session, cookies: &mut dyn CookieStorage) -> Result<()>;
}

/// In-process provider keeping its token table in memory.
///
/// Tokens map straight to users. A token can also be marked as rotated
/// (looking it up stages the replacement cookie, like a provider refresh) or
/// as failing (looking it up errors, like an unreachable provider).
pub struct LocalAuthProvider {
    cookie_name: String,
    attributes: CookieAttributes,
    tokens: RwLock<HashMap<String, User>>,
    rotations: RwLock<HashMap<String, String>>,
    failing: RwLock<HashSet<String>>,
    revoked: RwLock<HashSet<String>>,
}

impl LocalAuthProvider {
    pub fn new(cookie_name: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            attributes,
            tokens: RwLock::new(HashMap::new()),
            rotations: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            revoked: RwLock::new(HashSet::new()),
        }
    }

    pub fn insert_token(&self, token: impl Into<String>, user: User) {
        self.tokens.write().insert(token.into(), user);
    }

    /// Looking up `old` yields the session for `new` and stages `new` as the cookie value.
    pub fn rotate(&self, old: impl Into<String>, new: impl Into<String>) {
        self.rotations.write().insert(old.into(), new.into());
    }

    pub fn fail_token(&self, token: impl Into<String>) {
        self.failing.write().insert(token.into());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.read().contains(token)
    }

    fn clear_session_cookies(&self, cookies: &mut dyn CookieStorage) {
        for (name, _) in cookies.get_all() {
            if name == self.cookie_name || is_session_cookie(&name) {
                cookies.remove(&name, &self.attributes);
            }
        }
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn session_cookie_name(&self) -> &str { &self.cookie_name }

    async fn get_session(&self, cookies: &mut dyn CookieStorage) -> Result<Option<Session>> {
        let Some(token) = cookies.get(&self.cookie_name).filter(|t| !t.is_empty()) else { return Ok(None); };
        if self.failing.read().contains(&token) {
            return Err(anyhow!("auth provider unreachable"));
        }
        if self.is_revoked(&token) {
            self.clear_session_cookies(cookies);
            return Ok(None);
        }
        let rotated = self.rotations.read().get(&token).cloned();
        let current = rotated.clone().unwrap_or(token);
        let user = self.tokens.read().get(&current).cloned();
        match user {
            Some(user) => {
                if rotated.is_some() {
                    cookies.set(&self.cookie_name, &current, &self.attributes);
                }
                Ok(Some(Session::new(user, current)))
            }
            None => {
                self.clear_session_cookies(cookies);
                Ok(None)
            }
        }
    }

    async fn sign_out(&self, session: &Session, cookies: &mut dyn CookieStorage) -> Result<()> {
        self.tokens.write().remove(&session.access_token);
        self.revoked.write().insert(session.access_token.clone());
        tprintln!("local_auth.sign_out user={}", session.user.id);
        self.clear_session_cookies(cookies);
        Ok(())
    }
}
