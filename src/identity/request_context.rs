use axum::http::HeaderMap;

use crate::cookies::RequestCookies;

/// Snapshot of what arrived with one request. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub cookies: RequestCookies,
}

impl RequestContext {
    pub fn new(cookies: RequestCookies) -> Self {
        Self { request_id: uuid::Uuid::new_v4().simple().to_string(), cookies }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(RequestCookies::from_headers(headers))
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(RequestCookies::default())
    }
}
