//! # Storefront Error Type
//!
//! One error for pages and actions, plus the user-facing [`Outcome`] each
//! failure turns into.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  page loader / action                                                  │
//! │       │  Result<T, AppError>                                           │
//! │       ▼                                                                 │
//! │  ApiError::MissingToken | Unauthorized ──────► Outcome::RedirectToLogin │
//! │  CoreError / ValidationError ────────────────► Alert { rule message }   │
//! │  DbError::NotFound | UniqueViolation ────────► Alert { what happened }  │
//! │  ApiError::Http 4xx ─────────────────────────► Alert { backend message }│
//! │  everything else ── tracing::error! ─────────► Alert { generic text }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gearent_api::ApiError;
use gearent_core::{CoreError, StoreError, ValidationError};
use gearent_db::DbError;
use std::fmt;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A local file the operator pointed at couldn't be read.
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    /// A view model couldn't go through the route cache.
    #[error("View encoding failed: {0}")]
    View(#[from] serde_json::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Core(CoreError::Validation(err))
    }
}

/// What the shopper sees when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send the shopper to `/login`.
    RedirectToLogin,
    /// Show a message and stay on the page.
    Alert { message: String },
}

impl Outcome {
    pub fn alert(message: impl Into<String>) -> Self {
        Outcome::Alert {
            message: message.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::RedirectToLogin => f.write_str("redirect to /login"),
            Outcome::Alert { message } => f.write_str(message),
        }
    }
}

impl AppError {
    /// Whether the failure means the session is missing or rejected.
    pub fn needs_login(&self) -> bool {
        matches!(self, AppError::Api(e) if e.needs_login())
    }

    /// Maps the failure to what the shopper sees. Internal failures are
    /// logged here and shown as a generic message.
    pub fn outcome(&self) -> Outcome {
        match self {
            AppError::Api(e) if e.needs_login() => Outcome::RedirectToLogin,
            AppError::Api(ApiError::Http { status, message }) if (400..500).contains(status) => {
                Outcome::alert(message.clone())
            }
            AppError::Api(ApiError::Transport(_) | ApiError::Timeout) => {
                error!(error = %self, "Rental service unreachable");
                Outcome::alert("Could not reach the rental service. Please try again.")
            }
            AppError::Api(e) => {
                error!(error = %e, "Rental service request failed");
                Outcome::alert(GENERIC_FAILURE)
            }

            AppError::Core(e) => Outcome::alert(e.to_string()),

            AppError::Db(DbError::NotFound { entity, .. }) => {
                Outcome::alert(format!("{entity} not found"))
            }
            AppError::Db(DbError::UniqueViolation { field, value }) => {
                Outcome::alert(format!("{field} '{value}' already exists"))
            }
            AppError::Db(DbError::ForeignKeyViolation { message }) => {
                error!(message = %message, "Foreign key violation");
                Outcome::alert("Invalid reference")
            }
            AppError::Db(DbError::InvalidUpload(reason)) => {
                Outcome::alert(format!("Image rejected: {reason}"))
            }
            AppError::Db(e) => {
                error!(error = %e, "Database operation failed");
                Outcome::alert(GENERIC_FAILURE)
            }

            AppError::Store(e) => {
                error!(error = %e, "Cart storage failed");
                Outcome::alert("Could not save your cart. Please try again.")
            }
            AppError::Config(e) => Outcome::alert(e.to_string()),
            AppError::Io(e) => Outcome::alert(format!("Could not read file: {e}")),
            AppError::View(e) => {
                error!(error = %e, "View encoding failed");
                Outcome::alert(GENERIC_FAILURE)
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
