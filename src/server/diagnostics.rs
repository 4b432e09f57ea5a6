//! Opt-in cookie diagnostics.
//!
//! Lists the cookies that arrived with the request so session problems can be
//! debugged from a browser. Values are truncated to a short preview and are
//! never logged. Disabled unless `TUBELINK_DEBUG_COOKIES` is set.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::cookies::{is_session_cookie, RequestCookies};
use crate::error::AppError;

use super::{envelope, AppState};

pub const PREVIEW_CHARS: usize = 6;

#[derive(Debug, Serialize)]
pub struct CookieSummary {
    pub name: String,
    pub preview: String,
    pub length: usize,
    pub session: bool,
}

#[derive(Debug, Serialize)]
pub struct CookieReport {
    pub count: usize,
    pub session_cookies: usize,
    pub cookies: Vec<CookieSummary>,
}

/// At most `PREVIEW_CHARS` leading characters, and never more than half the value.
pub fn preview(value: &str) -> String {
    let total = value.chars().count();
    if total == 0 { return String::new(); }
    let keep = PREVIEW_CHARS.min(total / 2);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// The provider's cookie and its `.N` chunks count as session cookies too.
fn is_provider_cookie(name: &str, session_cookie: &str) -> bool {
    match name.strip_prefix(session_cookie) {
        Some("") => true,
        Some(rest) => rest.strip_prefix('.').map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())).unwrap_or(false),
        None => false,
    }
}

pub fn report(cookies: &RequestCookies, session_cookie: &str) -> CookieReport {
    let summaries: Vec<CookieSummary> = cookies
        .get_all()
        .iter()
        .map(|(name, value)| CookieSummary {
            name: name.clone(),
            preview: preview(value),
            length: value.len(),
            session: is_session_cookie(name) || is_provider_cookie(name, session_cookie),
        })
        .collect();
    CookieReport {
        count: summaries.len(),
        session_cookies: summaries.iter().filter(|c| c.session).count(),
        cookies: summaries,
    }
}

pub async fn debug_cookies(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.config.debug_cookies {
        let (status, body) = envelope::failure(&AppError::not_found("not_found", "Not found"));
        return (status, Json(body)).into_response();
    }
    let cookies = RequestCookies::from_headers(&headers);
    let r = report(&cookies, state.auth.session_cookie_name());
    debug!(count = r.count, session_cookies = r.session_cookies, "cookie diagnostics requested");
    let (status, body) = envelope::success(r);
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_never_show_full_value() {
        assert_eq!(preview(""), "");
        assert_eq!(preview("a"), "...");
        assert_eq!(preview("validtoken"), "valid...");
        assert_eq!(preview("base64-eyJhY2Nlc3NfdG9rZW4iOiJ4In0"), "base64...");
        assert_eq!(preview("ééééé"), "éé...");
    }

    #[test]
    fn report_flags_session_cookies() {
        let c = RequestCookies::from_pairs([("sb-abcd-auth-token", "validtoken"), ("theme", "dark")]);
        let r = report(&c, "sb-abcd-auth-token");
        assert_eq!(r.count, 2);
        assert_eq!(r.session_cookies, 1);
        assert!(r.cookies[0].session);
        assert_eq!(r.cookies[0].length, 10);
        assert!(!r.cookies[1].session);
    }

    #[test]
    fn report_flags_provider_cookie_and_chunks() {
        let c = RequestCookies::from_pairs([
            ("app_session", "validtoken"),
            ("app_session.0", "base64-abc"),
            ("app_session.1", "def"),
            ("app_session_theme", "dark"),
            ("app_session.x", "1"),
        ]);
        let r = report(&c, "app_session");
        let flags: Vec<bool> = r.cookies.iter().map(|c| c.session).collect();
        assert_eq!(flags, vec![true, true, true, false, false]);
        assert_eq!(r.session_cookies, 3);
    }
}
