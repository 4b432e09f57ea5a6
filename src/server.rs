//!
//! tubelink HTTP server
//! --------------------
//! Axum router for the bookmark API. Every data endpoint goes through the same
//! request lifecycle:
//!
//! 1. Read the request cookies into a `SessionBridge`.
//! 2. Resolve the session with the configured `AuthProvider`. Any cookie
//!    writes the provider makes (token rotation, clearing a dead session) are
//!    staged on the bridge.
//! 3. Unauthorized requests get a 401 envelope without touching the store.
//! 4. Authorized requests run the store operation scoped to the session user.
//! 5. The bridge is finalized and the staged cookies are written to the
//!    outgoing response, whether the operation succeeded, failed or panicked.

use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures_util::FutureExt; // for catch_unwind on async blocks
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::cookies;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthOutcome, AuthProvider, Session, SessionBridge};
use crate::store::{BookmarkStore, NewBookmark, StoreScope};
use crate::supabase::{GoTrueAuthProvider, PostgrestBookmarkStore, ProviderEndpoint};
use crate::video;

pub mod diagnostics;
pub mod envelope;

pub const MAX_LABEL_CHARS: usize = 200;
pub const MAX_NOTE_CHARS: usize = 2000;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn BookmarkStore>,
}

impl AppState {
    pub fn new(config: Config, auth: Arc<dyn AuthProvider>, store: Arc<dyn BookmarkStore>) -> Self {
        Self { config: Arc::new(config), auth, store }
    }

    /// GoTrue sessions and PostgREST storage for the configured project.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let endpoint = ProviderEndpoint::from_config(&config)?;
        let auth = GoTrueAuthProvider::new(endpoint.clone(), config.session_cookie_name(), config.cookie_attributes());
        let store = PostgrestBookmarkStore::new(endpoint);
        Ok(Self::new(config, Arc::new(auth), Arc::new(store)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "tubelink ok" }))
        .route("/api/timestamps", get(list_timestamps).post(create_timestamp))
        .route("/api/timestamps/{id}", delete(delete_timestamp))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/logout", post(logout))
        .route("/api/debug/cookies", get(diagnostics::debug_cookies))
        .with_state(state)
}

/// Serve on an already bound listener. Tests bind `127.0.0.1:0` and pass it here.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Starting server on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn log_startup(state: &AppState) {
    let config = &state.config;
    info!(
        target: "startup",
        "tubelink starting. provider={}, session_cookie={}, bind={}:{}, cookie_secure={}, timeout_secs={}",
        config.supabase_url, state.auth.session_cookie_name(), config.bind, config.http_port, config.cookie_secure, config.http_timeout_secs
    );
    if config.debug_cookies {
        warn!(target: "startup", "cookie diagnostics endpoint enabled at /api/debug/cookies");
    }
}

pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.http_port))?;
    let state = AppState::from_config(config)?;
    log_startup(&state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve(listener, state).await
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() { *s }
    else if let Some(s) = payload.downcast_ref::<String>() { s.as_str() }
    else { "panic" }
}

fn internal_panic() -> AppError {
    AppError::internal("internal_panic", "internal server error")
}

/// Resolve the session, converting a provider panic into an internal error.
async fn authorize_guarded(bridge: &mut SessionBridge, auth: &dyn AuthProvider) -> AppResult<AuthOutcome> {
    let request_id = bridge.request_id().to_string();
    match AssertUnwindSafe(bridge.authorize(auth)).catch_unwind().await {
        Ok(outcome) => Ok(outcome),
        Err(payload) => {
            error!(target: "panic", request_id = %request_id, "session resolution panic: {}", panic_message(&*payload));
            Err(internal_panic())
        }
    }
}

fn log_failure(request_id: &str, op: &str, err: &AppError) {
    match err {
        AppError::UserInput { .. } | AppError::NotFound { .. } => {
            debug!(request_id, op, code = err.code_str(), "request rejected: {}", err.message())
        }
        _ => error!(request_id, op, code = err.code_str(), "request failed: {}", err.message()),
    }
}

/// Finalize the bridge and write its staged cookies onto the response.
fn finish(bridge: &mut SessionBridge, request_id: &str, status: StatusCode, body: Value) -> Response {
    let staged = bridge.finalize();
    let mut resp = (status, Json(body)).into_response();
    let written = cookies::flush(resp.headers_mut(), &staged);
    debug!(request_id, status = status.as_u16(), cookies = written, "response finalized");
    resp
}

/// Run `work` for the session user, or answer 401 without running it.
async fn authorized<F, Fut, T>(state: &AppState, headers: &HeaderMap, op: &'static str, work: F) -> Response
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = AppResult<T>>,
    T: Serialize,
{
    let mut bridge = SessionBridge::from_headers(headers);
    let request_id = bridge.request_id().to_string();
    debug!(request_id = %request_id, op, cookies = bridge.context().cookies.len(), "request received");

    let (status, body) = match authorize_guarded(&mut bridge, state.auth.as_ref()).await {
        Err(e) => envelope::failure(&e),
        Ok(AuthOutcome::Unauthorized) => {
            debug!(request_id = %request_id, op, "no valid session");
            envelope::failure(&AppError::unauthorized())
        }
        Ok(AuthOutcome::Authorized(session)) => {
            debug!(request_id = %request_id, op, user_id = %session.user.id, "authorized");
            match AssertUnwindSafe(work(session)).catch_unwind().await {
                Ok(Ok(data)) => envelope::success(data),
                Ok(Err(e)) => {
                    log_failure(&request_id, op, &e);
                    envelope::failure(&e)
                }
                Err(payload) => {
                    error!(target: "panic", request_id = %request_id, op, "handler panic: {}", panic_message(&*payload));
                    envelope::failure(&internal_panic())
                }
            }
        }
    };
    finish(&mut bridge, &request_id, status, body)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimestampPayload {
    pub video_id: String,
    pub seconds: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateTimestampPayload {
    /// Normalize the video reference, check the offset and default the label.
    pub fn validate(self) -> AppResult<NewBookmark> {
        let video_id = video::parse_video_id(&self.video_id)
            .ok_or_else(|| AppError::user("invalid_video_id", "videoId must be a YouTube video id or URL"))?;
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(AppError::user("invalid_seconds", "seconds must be a non-negative number"));
        }
        let label = match self.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(l) if l.chars().count() > MAX_LABEL_CHARS => {
                return Err(AppError::user("label_too_long".to_string(), format!("label must be at most {} characters", MAX_LABEL_CHARS)));
            }
            Some(l) => l.to_string(),
            None => video::format_timestamp(self.seconds),
        };
        let note = self.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS) {
            return Err(AppError::user("note_too_long".to_string(), format!("note must be at most {} characters", MAX_NOTE_CHARS)));
        }
        Ok(NewBookmark { video_id, seconds: self.seconds, label, note })
    }
}

async fn list_timestamps(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let store = state.store.clone();
    authorized(&state, &headers, "list_timestamps", move |session| async move {
        let Query(query) = query.map_err(|e| AppError::user("invalid_query".to_string(), e.body_text()))?;
        // Unrecognized filters are passed through and simply match nothing.
        let video_id = query
            .video_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| video::parse_video_id(v).unwrap_or_else(|| v.to_string()));
        let rows = store.list(&StoreScope::for_session(&session), video_id.as_deref()).await?;
        Ok::<_, AppError>(rows)
    })
    .await
}

async fn create_timestamp(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateTimestampPayload>, JsonRejection>,
) -> Response {
    let store = state.store.clone();
    authorized(&state, &headers, "create_timestamp", move |session| async move {
        let Json(payload) = payload.map_err(|e| AppError::user("invalid_body".to_string(), e.body_text()))?;
        let new = payload.validate()?;
        let row = store.create(&StoreScope::for_session(&session), new).await?;
        info!(user_id = %row.user_id, video_id = %row.video_id, id = %row.id, "timestamp created");
        Ok::<_, AppError>(row)
    })
    .await
}

async fn delete_timestamp(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let store = state.store.clone();
    authorized(&state, &headers, "delete_timestamp", move |session| async move {
        let row = store.delete(&StoreScope::for_session(&session), &id).await?;
        info!(user_id = %row.user_id, id = %row.id, "timestamp deleted");
        Ok::<_, AppError>(row)
    })
    .await
}

async fn current_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    authorized(&state, &headers, "current_session", |session| async move { Ok::<_, AppError>(session.user) }).await
}

/// Revoke the session upstream and clear its cookies. Upstream failures are
/// logged by the provider; the cookies are cleared regardless.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut bridge = SessionBridge::from_headers(&headers);
    let request_id = bridge.request_id().to_string();
    debug!(request_id = %request_id, op = "logout", "request received");

    let (status, body) = match authorize_guarded(&mut bridge, state.auth.as_ref()).await {
        Err(e) => envelope::failure(&e),
        Ok(AuthOutcome::Unauthorized) => envelope::failure(&AppError::unauthorized()),
        Ok(AuthOutcome::Authorized(session)) => {
            match AssertUnwindSafe(bridge.sign_out(state.auth.as_ref(), &session)).catch_unwind().await {
                Ok(Ok(())) => {
                    info!(request_id = %request_id, user_id = %session.user.id, "signed out");
                    envelope::success_empty()
                }
                Ok(Err(e)) => {
                    let err = AppError::from(e);
                    log_failure(&request_id, "logout", &err);
                    envelope::failure(&err)
                }
                Err(payload) => {
                    error!(target: "panic", request_id = %request_id, "logout panic: {}", panic_message(&*payload));
                    envelope::failure(&internal_panic())
                }
            }
        }
    };
    finish(&mut bridge, &request_id, status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_owns_the_configured_session_cookie() {
        let config = Config::from_lookup(|n| match n {
            "SUPABASE_URL" => Some("https://abcd.supabase.co".to_string()),
            "SUPABASE_ANON_KEY" => Some("anon".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.auth.session_cookie_name(), "sb-abcd-auth-token");
        assert_eq!(state.auth.session_cookie_name(), state.config.session_cookie_name());
    }

    fn payload(video_id: &str, seconds: f64) -> CreateTimestampPayload {
        CreateTimestampPayload { video_id: video_id.into(), seconds, label: None, note: None }
    }

    #[test]
    fn create_payload_normalizes_video_and_label() {
        let new = payload("https://youtu.be/dQw4w9WgXcQ?t=42", 83.0).validate().unwrap();
        assert_eq!(new.video_id, "dQw4w9WgXcQ");
        assert_eq!(new.label, "1:23");
        assert!(new.note.is_none());

        let mut p = payload("dQw4w9WgXcQ", 5.0);
        p.label = Some("  intro  ".into());
        p.note = Some("   ".into());
        let new = p.validate().unwrap();
        assert_eq!(new.label, "intro");
        assert!(new.note.is_none());
    }

    #[test]
    fn create_payload_rejections() {
        assert_eq!(payload("not a video", 1.0).validate().unwrap_err().code_str(), "invalid_video_id");
        assert_eq!(payload("dQw4w9WgXcQ", -1.0).validate().unwrap_err().code_str(), "invalid_seconds");
        assert_eq!(payload("dQw4w9WgXcQ", f64::NAN).validate().unwrap_err().code_str(), "invalid_seconds");
        let mut p = payload("dQw4w9WgXcQ", 1.0);
        p.label = Some("x".repeat(MAX_LABEL_CHARS + 1));
        assert_eq!(p.validate().unwrap_err().http_status(), 400);
    }

    #[test]
    fn panic_payloads() {
        let s: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*s), "boom");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*s), "bang");
        let s: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*s), "panic");
    }
}
