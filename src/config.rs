//! Service configuration loaded from the environment.
//!
//! The provider base URL and public key are required; a missing or malformed
//! value is a fatal `AppError::Config` raised before the listener binds.

use std::env;

use reqwest::Url;

use crate::cookies::CookieAttributes;
use crate::error::{AppError, AppResult};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct Config {
    /// Provider base URL without trailing slash, e.g. `https://abcd.supabase.co`.
    pub supabase_url: String,
    /// Public (anon) key sent as `apikey` on every provider request.
    pub supabase_anon_key: String,
    pub http_port: u16,
    pub bind: String,
    /// Mark session cookies `Secure`. Disable only for plain-http local development.
    pub cookie_secure: bool,
    /// Expose `GET /api/debug/cookies`.
    pub debug_cookies: bool,
    /// Upper bound for every provider call.
    pub http_timeout_secs: u64,
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| names.iter().find_map(|n| lookup(*n).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()));

        let Some(raw_url) = first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]) else {
            return Err(AppError::config("missing_supabase_url", "SUPABASE_URL (or NEXT_PUBLIC_SUPABASE_URL) must be set"));
        };
        let Some(anon_key) = first(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]) else {
            return Err(AppError::config("missing_supabase_anon_key", "SUPABASE_ANON_KEY (or NEXT_PUBLIC_SUPABASE_ANON_KEY) must be set"));
        };
        let url = Url::parse(&raw_url)
            .map_err(|e| AppError::config("invalid_supabase_url".to_string(), format!("SUPABASE_URL is not a valid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AppError::config("invalid_supabase_url", "SUPABASE_URL must be an http(s) URL with a host"));
        }

        let http_port = match first(&["TUBELINK_HTTP_PORT"]) {
            Some(v) => v.parse::<u16>().map_err(|_| AppError::config("invalid_http_port".to_string(), format!("TUBELINK_HTTP_PORT is not a port: {}", v)))?,
            None => DEFAULT_HTTP_PORT,
        };
        let http_timeout_secs = match first(&["TUBELINK_HTTP_TIMEOUT_SECS"]) {
            Some(v) => v.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                AppError::config("invalid_http_timeout".to_string(), format!("TUBELINK_HTTP_TIMEOUT_SECS must be a positive number of seconds: {}", v))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            supabase_url: raw_url.trim_end_matches('/').to_string(),
            supabase_anon_key: anon_key,
            http_port,
            bind: first(&["TUBELINK_BIND"]).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            cookie_secure: first(&["TUBELINK_COOKIE_SECURE"]).and_then(|v| parse_bool(&v)).unwrap_or(true),
            debug_cookies: first(&["TUBELINK_DEBUG_COOKIES"]).and_then(|v| parse_bool(&v)).unwrap_or(false),
            http_timeout_secs,
        })
    }

    /// First DNS label of the provider host: `https://abcd.supabase.co` → `abcd`.
    pub fn project_ref(&self) -> String {
        Url::parse(&self.supabase_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
            .unwrap_or_default()
    }

    /// `sb-<project ref>-auth-token`
    pub fn session_cookie_name(&self) -> String {
        format!("sb-{}-auth-token", self.project_ref())
    }

    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes::session(self.cookie_secure)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("http_port", &self.http_port)
            .field("bind", &self.bind)
            .field("cookie_secure", &self.cookie_secure)
            .field("debug_cookies", &self.debug_cookies)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(vars: &[(&str, &str)]) -> AppResult<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|n| map.get(n).cloned())
    }

    #[test]
    fn required_values_fail_fast() {
        let err = from(&[]).unwrap_err();
        assert_eq!(err.code_str(), "missing_supabase_url");
        let err = from(&[("SUPABASE_URL", "https://abcd.supabase.co")]).unwrap_err();
        assert_eq!(err.code_str(), "missing_supabase_anon_key");
        let err = from(&[("SUPABASE_URL", "   "), ("SUPABASE_ANON_KEY", "k")]).unwrap_err();
        assert_eq!(err.code_str(), "missing_supabase_url");
        let err = from(&[("SUPABASE_URL", "ftp://abcd.supabase.co"), ("SUPABASE_ANON_KEY", "k")]).unwrap_err();
        assert_eq!(err.code_str(), "invalid_supabase_url");
    }

    #[test]
    fn defaults_and_public_fallbacks() {
        let c = from(&[("NEXT_PUBLIC_SUPABASE_URL", "https://abcd.supabase.co/"), ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon")]).unwrap();
        assert_eq!(c.supabase_url, "https://abcd.supabase.co");
        assert_eq!(c.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(c.bind, DEFAULT_BIND);
        assert!(c.cookie_secure);
        assert!(!c.debug_cookies);
        assert_eq!(c.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(c.project_ref(), "abcd");
        assert_eq!(c.session_cookie_name(), "sb-abcd-auth-token");
    }

    #[test]
    fn overrides() {
        let c = from(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("TUBELINK_HTTP_PORT", "8080"),
            ("TUBELINK_COOKIE_SECURE", "off"),
            ("TUBELINK_DEBUG_COOKIES", "yes"),
            ("TUBELINK_HTTP_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(c.http_port, 8080);
        assert!(!c.cookie_secure);
        assert!(c.debug_cookies);
        assert_eq!(c.http_timeout_secs, 3);
        assert_eq!(c.session_cookie_name(), "sb-localhost-auth-token");
        assert!(!c.cookie_attributes().secure);

        let err = from(&[("SUPABASE_URL", "https://a.b"), ("SUPABASE_ANON_KEY", "k"), ("TUBELINK_HTTP_PORT", "http")]).unwrap_err();
        assert_eq!(err.code_str(), "invalid_http_port");
    }

    #[test]
    fn malformed_timeout_fails_fast() {
        for bad in ["soon", "0", "-5", "1.5"] {
            let err = from(&[("SUPABASE_URL", "https://a.b"), ("SUPABASE_ANON_KEY", "k"), ("TUBELINK_HTTP_TIMEOUT_SECS", bad)]).unwrap_err();
            assert_eq!(err.code_str(), "invalid_http_timeout");
            assert_eq!(err.http_status(), 500);
        }
    }

    #[test]
    fn debug_hides_key() {
        let c = from(&[("SUPABASE_URL", "https://abcd.supabase.co"), ("SUPABASE_ANON_KEY", "very-secret-key")]).unwrap();
        assert!(!format!("{:?}", c).contains("very-secret-key"));
    }
}
