//!
//! tubelink bookmark store
//! -----------------------
//! Timeline bookmarks live in the provider's relational store. This module
//! defines the row model and the `BookmarkStore` seam the handlers talk to.
//!
//! Every operation takes a `StoreScope`, and every implementation must filter
//! by `scope.user_id`. There is no unscoped query in this API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Session;

mod memory;

pub use memory::MemoryBookmarkStore;

/// A saved moment in a YouTube video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    /// Offset into the video, in seconds.
    pub seconds: f64,
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new bookmark; the owner comes from the scope.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookmark {
    pub video_id: String,
    pub seconds: f64,
    pub label: String,
    pub note: Option<String>,
}

/// Who a store call acts for.
#[derive(Clone)]
pub struct StoreScope {
    pub user_id: String,
    pub access_token: String,
}

impl StoreScope {
    pub fn for_session(session: &Session) -> Self {
        Self { user_id: session.user.id.clone(), access_token: session.access_token.clone() }
    }
}

impl std::fmt::Debug for StoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreScope").field("user_id", &self.user_id).finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store reply could not be decoded: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Bookmarks owned by the scope's user, newest first, optionally limited to one video.
    async fn list(&self, scope: &StoreScope, video_id: Option<&str>) -> Result<Vec<Bookmark>, StoreError>;

    async fn create(&self, scope: &StoreScope, new: NewBookmark) -> Result<Bookmark, StoreError>;

    /// Delete one of the scope user's bookmarks. `NotFound` when the user owns no such row.
    async fn delete(&self, scope: &StoreScope, id: &str) -> Result<Bookmark, StoreError>;
}
