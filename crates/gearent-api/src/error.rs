//! # API Error Types
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  no token stored, auth required   → MissingToken   (request not sent)  │
//! │  401                              → Unauthorized                       │
//! │  other non-2xx                    → Http { status, message }           │
//! │  connect / IO failure             → Transport                          │
//! │  request exceeded the timeout     → Timeout                            │
//! │  body didn't match any shape      → Decode                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// An authenticated endpoint was called with no bearer token stored.
    #[error("not signed in")]
    MissingToken,

    /// The backend rejected the token (HTTP 401).
    #[error("session expired or invalid: {0}")]
    Unauthorized(String),

    /// Any other non-success status. `message` is the backend's own text
    /// when the body carries one.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// The response body didn't match any accepted shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the user has to sign in (again) to continue.
    pub fn needs_login(&self) -> bool {
        matches!(self, ApiError::MissingToken | ApiError::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
