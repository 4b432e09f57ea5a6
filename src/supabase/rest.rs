use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::store::{Bookmark, BookmarkStore, NewBookmark, StoreError, StoreScope};

use super::ProviderEndpoint;

/// Row shape of the `bookmarks` table.
#[derive(Debug, Deserialize)]
struct BookmarkRow {
    id: String,
    user_id: String,
    video_id: String,
    seconds: f64,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BookmarkRow> for Bookmark {
    fn from(r: BookmarkRow) -> Self {
        let label = r.label.unwrap_or_else(|| crate::video::format_timestamp(r.seconds));
        Bookmark { id: r.id, user_id: r.user_id, video_id: r.video_id, seconds: r.seconds, label, note: r.note, created_at: r.created_at }
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    video_id: &'a str,
    seconds: f64,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

/// Bookmark store backed by PostgREST (`/rest/v1/<table>`).
pub struct PostgrestBookmarkStore {
    endpoint: ProviderEndpoint,
    table: String,
}

impl PostgrestBookmarkStore {
    pub const DEFAULT_TABLE: &'static str = "bookmarks";

    pub fn new(endpoint: ProviderEndpoint) -> Self {
        Self::with_table(endpoint, Self::DEFAULT_TABLE)
    }

    pub fn with_table(endpoint: ProviderEndpoint, table: impl Into<String>) -> Self {
        Self { endpoint, table: table.into() }
    }

    fn path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }

    async fn send_rows(&self, op: &str, req: RequestBuilder, scope: &StoreScope) -> Result<Vec<Bookmark>, StoreError> {
        let resp = req
            .bearer_auth(&scope.access_token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let resp = check_status(op, resp).await?;
        let rows: Vec<BookmarkRow> = resp.json().await.map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(rows.into_iter().map(Bookmark::from).collect())
    }
}

async fn check_status(op: &str, resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let body = resp.text().await.unwrap_or_default();
    error!(op, status = status.as_u16(), "postgrest request failed: {}", body);
    Err(StoreError::Status { status: status.as_u16(), body })
}

fn eq(v: &str) -> String {
    format!("eq.{}", v)
}

#[async_trait]
impl BookmarkStore for PostgrestBookmarkStore {
    async fn list(&self, scope: &StoreScope, video_id: Option<&str>) -> Result<Vec<Bookmark>, StoreError> {
        let mut params: Vec<(&str, String)> = vec![("select", "*".to_string()), ("user_id", eq(&scope.user_id))];
        if let Some(v) = video_id { params.push(("video_id", eq(v))); }
        params.push(("order", "created_at.desc".to_string()));
        let req = self.endpoint.get(&self.path()).query(&params);
        self.send_rows("list", req, scope).await
    }

    async fn create(&self, scope: &StoreScope, new: NewBookmark) -> Result<Bookmark, StoreError> {
        let row = InsertRow {
            user_id: &scope.user_id,
            video_id: &new.video_id,
            seconds: new.seconds,
            label: &new.label,
            note: new.note.as_deref(),
        };
        let req = self.endpoint.post(&self.path()).header("Prefer", "return=representation").json(&row);
        self.send_rows("create", req, scope)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".into()))
    }

    async fn delete(&self, scope: &StoreScope, id: &str) -> Result<Bookmark, StoreError> {
        let params = [("id", eq(id)), ("user_id", eq(&scope.user_id))];
        let req = self.endpoint.delete(&self.path()).query(&params).header("Prefer", "return=representation");
        self.send_rows("delete", req, scope)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound("bookmark".into()))
    }
}
