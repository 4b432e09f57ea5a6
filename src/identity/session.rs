use super::principal::User;

pub type SessionToken = String;

/// A validated provider session for the duration of one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    /// Forwarded to the store so the provider's row-level policies apply too.
    pub access_token: SessionToken,
    pub refresh_token: Option<SessionToken>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
}

impl Session {
    pub fn new(user: User, access_token: impl Into<String>) -> Self {
        Self { user, access_token: access_token.into(), refresh_token: None, expires_at: None }
    }

    pub fn user_id(&self) -> &str { &self.user.id }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of resolving the session for a request.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Valid(Session),
    Absent,
    /// Validation failed (network, timeout, malformed provider reply).
    /// Callers treat this the same as `Absent`.
    Error(String),
}

impl SessionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Valid(_) => "ok",
            SessionOutcome::Absent => "absent",
            SessionOutcome::Error(_) => "error",
        }
    }
}

/// What a caller acts on: either a session to scope work by, or a rejection
/// that it turns into a 401 (or a redirect for page navigation).
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authorized(Session),
    Unauthorized,
}

impl AuthOutcome {
    pub fn is_authorized(&self) -> bool { matches!(self, AuthOutcome::Authorized(_)) }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthOutcome::Authorized(s) => Some(s),
            AuthOutcome::Unauthorized => None,
        }
    }
}

impl From<SessionOutcome> for AuthOutcome {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Valid(s) => AuthOutcome::Authorized(s),
            SessionOutcome::Absent | SessionOutcome::Error(_) => AuthOutcome::Unauthorized,
        }
    }
}
