use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cookies::CookieAttributes;
use crate::identity::{AuthProvider, CookieStorage, Session, User};

use super::session_cookie::{self, ProviderUser, StoredSession};
use super::ProviderEndpoint;

/// Tokens this close to expiry are refreshed instead of validated.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

enum UserLookup {
    Found(User),
    Rejected,
}

/// Auth provider backed by the GoTrue REST API (`/auth/v1`).
pub struct GoTrueAuthProvider {
    endpoint: ProviderEndpoint,
    cookie_name: String,
    attributes: CookieAttributes,
}

impl GoTrueAuthProvider {
    pub fn new(endpoint: ProviderEndpoint, cookie_name: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self { endpoint, cookie_name: cookie_name.into(), attributes }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<UserLookup> {
        let resp = self
            .endpoint
            .get("/auth/v1/user")
            .bearer_auth(access_token)
            .send()
            .await
            .context("auth user lookup request failed")?;
        match resp.status() {
            s if s.is_success() => {
                let user: ProviderUser = resp.json().await.context("auth user lookup returned an invalid body")?;
                Ok(UserLookup::Found(user.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(UserLookup::Rejected),
            s => bail!("auth user lookup returned {}", s),
        }
    }

    async fn refresh(&self, cookies: &mut dyn CookieStorage, stored: &StoredSession) -> Result<Option<Session>> {
        let Some(refresh_token) = stored.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            debug!("session expired without a refresh token; clearing");
            session_cookie::clear_session(cookies, &self.cookie_name, &self.attributes);
            return Ok(None);
        };
        let resp = self
            .endpoint
            .post("/auth/v1/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("token refresh request failed")?;
        let status = resp.status();
        if status.is_client_error() {
            info!(status = status.as_u16(), "refresh token rejected; clearing session cookies");
            session_cookie::clear_session(cookies, &self.cookie_name, &self.attributes);
            return Ok(None);
        }
        if !status.is_success() {
            bail!("token refresh returned {}", status);
        }
        let mut fresh: StoredSession = resp.json().await.context("token refresh returned an invalid body")?;
        if fresh.expires_at.is_none() {
            fresh.expires_at = fresh.expires_in.map(|secs| chrono::Utc::now().timestamp() + secs);
        }
        let Some(user) = fresh.user.clone() else { bail!("token refresh returned no user") };
        let encoded = session_cookie::encode(&fresh)?;
        session_cookie::write_session(cookies, &self.cookie_name, &encoded, &self.attributes);
        debug!(user_id = %user.id, "session refreshed");
        Ok(Some(to_session(fresh, user.into())))
    }
}

fn to_session(stored: StoredSession, user: User) -> Session {
    Session {
        user,
        access_token: stored.access_token,
        refresh_token: stored.refresh_token,
        expires_at: stored.expires_at,
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    fn session_cookie_name(&self) -> &str { &self.cookie_name }

    async fn get_session(&self, cookies: &mut dyn CookieStorage) -> Result<Option<Session>> {
        let Some(raw) = session_cookie::read_chunked(cookies, &self.cookie_name) else { return Ok(None); };
        let stored = match session_cookie::decode(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!("undecodable session cookie; clearing: {:#}", e);
                session_cookie::clear_session(cookies, &self.cookie_name, &self.attributes);
                return Ok(None);
            }
        };
        let now = chrono::Utc::now().timestamp();
        let expiring = stored.expires_at.map(|at| at - EXPIRY_MARGIN_SECS <= now).unwrap_or(false);
        if !expiring {
            if let UserLookup::Found(user) = self.fetch_user(&stored.access_token).await? {
                return Ok(Some(to_session(stored, user)));
            }
        }
        self.refresh(cookies, &stored).await
    }

    async fn sign_out(&self, session: &Session, cookies: &mut dyn CookieStorage) -> Result<()> {
        let result = self
            .endpoint
            .post("/auth/v1/logout?scope=local")
            .bearer_auth(&session.access_token)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() || resp.status() == StatusCode::UNAUTHORIZED => {}
            Ok(resp) => warn!(status = resp.status().as_u16(), user_id = %session.user.id, "upstream logout failed; clearing cookies anyway"),
            Err(e) => warn!(user_id = %session.user.id, "upstream logout request failed; clearing cookies anyway: {}", e),
        }
        session_cookie::clear_session(cookies, &self.cookie_name, &self.attributes);
        Ok(())
    }
}
