//! JSON response envelope shared by every endpoint:
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::error::AppError;

pub fn success<T: Serialize>(data: T) -> (StatusCode, Value) {
    match serde_json::to_value(data) {
        Ok(v) => (StatusCode::OK, json!({ "success": true, "data": v })),
        Err(e) => {
            error!("response serialization failed: {}", e);
            failure(&AppError::internal("serialize_error", "response serialization failed"))
        }
    }
}

pub fn success_empty() -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "success": true }))
}

pub fn failure(err: &AppError) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, json!({ "success": false, "error": err.public_message() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        let (s, v) = success(vec![1, 2]);
        assert_eq!(s, StatusCode::OK);
        assert_eq!(v, json!({"success": true, "data": [1, 2]}));

        let (s, v) = success_empty();
        assert_eq!(s, StatusCode::OK);
        assert_eq!(v, json!({"success": true}));

        let (s, v) = failure(&AppError::unauthorized());
        assert_eq!(s, StatusCode::UNAUTHORIZED);
        assert_eq!(v["success"], json!(false));
        assert!(v["error"].as_str().unwrap().len() > 0);
        assert!(v.get("data").is_none());

        let (s, v) = failure(&AppError::store("store_error", "relation \"bookmarks\" does not exist"));
        assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!v["error"].as_str().unwrap().contains("relation"));
    }
}
