//! Per-request session bridge.
//!
//! The bridge is the cookie storage an `AuthProvider` sees while it validates
//! or refreshes a session: reads come from the request snapshot, writes are
//! staged in a `MutationSet` that the handler flushes onto its response. A
//! bridge is built for exactly one request and never shared.

use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::cookies::{CookieAttributes, MutationSet};

use super::provider::{AuthProvider, CookieStorage};
use super::request_context::RequestContext;
use super::session::{AuthOutcome, Session, SessionOutcome};

pub struct SessionBridge {
    context: RequestContext,
    pending: MutationSet,
    finalized: bool,
}

impl SessionBridge {
    pub fn new(context: RequestContext) -> Self {
        Self { context, pending: MutationSet::new(), finalized: false }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(RequestContext::from_headers(headers))
    }

    pub fn context(&self) -> &RequestContext { &self.context }

    pub fn request_id(&self) -> &str { &self.context.request_id }

    pub fn pending(&self) -> &MutationSet { &self.pending }

    pub fn is_finalized(&self) -> bool { self.finalized }

    /// Ask the provider for the current session. Provider failures are logged
    /// and reported as `SessionOutcome::Error`, never propagated.
    pub async fn resolve(&mut self, provider: &dyn AuthProvider) -> SessionOutcome {
        let outcome = match provider.get_session(self).await {
            Ok(Some(session)) => SessionOutcome::Valid(session),
            Ok(None) => SessionOutcome::Absent,
            Err(e) => {
                warn!(request_id = %self.context.request_id, "session validation failed: {:#}", e);
                SessionOutcome::Error(e.to_string())
            }
        };
        debug!(
            request_id = %self.context.request_id,
            outcome = outcome.label(),
            staged = self.pending.len(),
            "session resolved"
        );
        outcome
    }

    pub async fn authorize(&mut self, provider: &dyn AuthProvider) -> AuthOutcome {
        self.resolve(provider).await.into()
    }

    /// End the session upstream; the provider stages the cookie removals.
    pub async fn sign_out(&mut self, provider: &dyn AuthProvider, session: &Session) -> anyhow::Result<()> {
        provider.sign_out(session, self).await
    }

    /// Hand over the staged mutations. Later writes are dropped with a warning.
    pub fn finalize(&mut self) -> MutationSet {
        self.finalized = true;
        std::mem::take(&mut self.pending)
    }
}

impl CookieStorage for SessionBridge {
    fn get(&self, name: &str) -> Option<String> {
        self.context.cookies.get(name).map(str::to_string)
    }

    fn get_all(&self) -> Vec<(String, String)> {
        self.context.cookies.get_all().to_vec()
    }

    fn set(&mut self, name: &str, value: &str, attributes: &CookieAttributes) {
        if self.finalized {
            warn!(request_id = %self.context.request_id, cookie = name, "cookie write after response was finalized; dropped");
            return;
        }
        self.pending.set(name, value, attributes);
    }

    fn remove(&mut self, name: &str, attributes: &CookieAttributes) {
        self.set(name, "", &attributes.expired());
    }
}

/// Build a bridge for `context`, resolve the session and return the outcome
/// together with the cookie writes the provider requested on the way.
pub async fn resolve_session(context: RequestContext, provider: &dyn AuthProvider) -> (SessionOutcome, MutationSet) {
    let mut bridge = SessionBridge::new(context);
    let outcome = bridge.resolve(provider).await;
    (outcome, bridge.finalize())
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod bridge_tests;
