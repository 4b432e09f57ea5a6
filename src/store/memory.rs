use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::{Bookmark, BookmarkStore, NewBookmark, StoreError, StoreScope};

/// Bookmark store held in process memory.
///
/// Counts every operation it receives so callers can check that rejected
/// requests never reached the store.
#[derive(Default)]
pub struct MemoryBookmarkStore {
    rows: RwLock<Vec<Bookmark>>,
    operations: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryBookmarkStore {
    pub fn new() -> Self { Self::default() }

    /// Insert a row as-is, bypassing scoping. Meant for seeding.
    pub fn seed(&self, row: Bookmark) {
        self.rows.write().push(row);
    }

    pub fn operations(&self) -> usize { self.operations.load(Ordering::SeqCst) }

    pub fn len(&self) -> usize { self.rows.read().len() }

    pub fn is_empty(&self) -> bool { self.rows.read().is_empty() }

    /// While set, every operation fails like an unavailable backend.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn begin(&self, op: &str, scope: &StoreScope) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        debug!(op, user_id = %scope.user_id, "memory_store");
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status { status: 503, body: "memory store marked unavailable".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn list(&self, scope: &StoreScope, video_id: Option<&str>) -> Result<Vec<Bookmark>, StoreError> {
        self.begin("list", scope)?;
        let mut out: Vec<Bookmark> = self
            .rows
            .read()
            .iter()
            .filter(|b| b.user_id == scope.user_id)
            .filter(|b| video_id.map(|v| b.video_id == v).unwrap_or(true))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn create(&self, scope: &StoreScope, new: NewBookmark) -> Result<Bookmark, StoreError> {
        self.begin("create", scope)?;
        let row = Bookmark {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: scope.user_id.clone(),
            video_id: new.video_id,
            seconds: new.seconds,
            label: new.label,
            note: new.note,
            created_at: Utc::now(),
        };
        self.rows.write().push(row.clone());
        Ok(row)
    }

    async fn delete(&self, scope: &StoreScope, id: &str) -> Result<Bookmark, StoreError> {
        self.begin("delete", scope)?;
        let mut rows = self.rows.write();
        match rows.iter().position(|b| b.id == id && b.user_id == scope.user_id) {
            Some(idx) => Ok(rows.remove(idx)),
            None => Err(StoreError::NotFound("bookmark".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn scope(user: &str) -> StoreScope {
        StoreScope { user_id: user.into(), access_token: format!("token-{user}") }
    }

    fn row(id: &str, user: &str, video: &str, minute: i64) -> Bookmark {
        Bookmark {
            id: id.into(),
            user_id: user.into(),
            video_id: video.into(),
            seconds: 30.0,
            label: "0:30".into(),
            note: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let store = MemoryBookmarkStore::new();
        store.seed(row("a1", "alice", "dQw4w9WgXcQ", 1));
        store.seed(row("b1", "bob", "dQw4w9WgXcQ", 2));
        store.seed(row("a2", "alice", "9bZkp7q19f0", 3));

        let ids: Vec<String> = store.list(&scope("alice"), None).await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
        let only: Vec<String> = store.list(&scope("alice"), Some("dQw4w9WgXcQ")).await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(only, vec!["a1"]);
        assert!(store.list(&scope("alice"), Some("unknownvid1")).await.unwrap().is_empty());
        assert_eq!(store.operations(), 3);
    }

    #[tokio::test]
    async fn delete_only_touches_own_rows() {
        let store = MemoryBookmarkStore::new();
        store.seed(row("b1", "bob", "dQw4w9WgXcQ", 0));
        let err = store.delete(&scope("alice"), "b1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.len(), 1);
        let gone = store.delete(&scope("bob"), "b1").await.unwrap();
        assert_eq!(gone.id, "b1");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn create_assigns_owner_from_scope() {
        let store = MemoryBookmarkStore::new();
        let new = NewBookmark { video_id: "dQw4w9WgXcQ".into(), seconds: 42.0, label: "0:42".into(), note: Some("chorus".into()) };
        let created = store.create(&scope("carol"), new).await.unwrap();
        assert_eq!(created.user_id, "carol");
        assert_eq!(store.list(&scope("carol"), None).await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn failing_store_reports_status() {
        let store = MemoryBookmarkStore::new();
        store.set_failing(true);
        let err = store.list(&scope("alice"), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 503, .. }));
    }
}
