//! Identity and session handling for one request at a time.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod request_context;
mod bridge;

pub use principal::User;
pub use session::{AuthOutcome, Session, SessionOutcome, SessionToken};
pub use provider::{AuthProvider, CookieStorage, LocalAuthProvider};
pub use request_context::RequestContext;
pub use bridge::{resolve_session, SessionBridge};
