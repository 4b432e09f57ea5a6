pub use cookie::SameSite;

/// 400 days, the longest lifetime browsers accept for a persistent cookie.
pub const SESSION_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// Attributes staged alongside a cookie write. Rendered verbatim by the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Max-Age in seconds. `Some(0)` instructs the client to discard the cookie.
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieAttributes {
    /// Attributes for session cookies: site-wide, long-lived, Lax.
    pub fn session(secure: bool) -> Self {
        Self {
            max_age: Some(SESSION_MAX_AGE_SECS),
            path: Some("/".to_string()),
            domain: None,
            secure,
            http_only: true,
            same_site: Some(SameSite::Lax),
        }
    }

    /// Same attributes with an expired Max-Age, which is what a removal stages.
    pub fn expired(&self) -> Self {
        Self { max_age: Some(0), ..self.clone() }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.max_age, Some(age) if age <= 0)
    }
}
