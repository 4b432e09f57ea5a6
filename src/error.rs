//! Unified application error model and mapping helpers.
//! Every route handler boundary converts failures into an `AppError`, which in
//! turn maps onto an HTTP status and the JSON response envelope. Nothing below
//! the handler boundary is allowed to reach the transport layer unhandled.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    Config { code: String, message: String },
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    NotFound { code: String, message: String },
    Store { code: String, message: String },
    Cookie { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Config { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Store { code, .. }
            | AppError::Cookie { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Config { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Store { message, .. }
            | AppError::Cookie { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn store<S: Into<String>>(code: S, msg: S) -> Self { AppError::Store { code: code.into(), message: msg.into() } }
    pub fn cookie<S: Into<String>>(code: S, msg: S) -> Self { AppError::Cookie { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// The 401 every authorized endpoint answers with when no valid session exists.
    pub fn unauthorized() -> Self { AppError::auth("unauthorized", "Not authenticated") }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::Config { .. }
            | AppError::Store { .. }
            | AppError::Cookie { .. }
            | AppError::Internal { .. } => 500,
        }
    }

    /// Message safe to show a client. Store and internal failures collapse to a
    /// generic text; their detail only goes to the log.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Store { .. } => "The data service failed to complete the request",
            AppError::Internal { .. } | AppError::Config { .. } | AppError::Cookie { .. } => "Internal server error",
            _ => self.message(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Prefer an AppError carried inside the anyhow chain
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal { code: "internal_error".into(), message: format!("{:#}", other) },
        }
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::NotFound(what) => AppError::not_found("not_found".to_string(), format!("{} not found", what)),
            other => AppError::Store { code: "store_error".into(), message: other.to_string() },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
