use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the auth provider.
///
/// `id` is the scoping key for every store query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), email: None }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
