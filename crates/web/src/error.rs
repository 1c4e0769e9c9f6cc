//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use delicious_core::catalog::CatalogError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::photos::PhotoError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Photo upload failed.
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    /// Submitted data failed validation.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Logged in, but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError<RepositoryError>> for AppError {
    fn from(err: CatalogError<RepositoryError>) -> Self {
        match err {
            CatalogError::Validation(e) => Self::Validation(e.to_string()),
            CatalogError::SlugPattern(e) => Self::Internal(format!("slug pattern: {e}")),
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    /// Whether this is a server-side failure worth reporting.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Photo(err) => !err.is_client_error(),
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_) | AuthError::Invalid(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Photo(err) => {
                if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid Login!".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "That Email is not valid!".to_string(),
                AuthError::Invalid(messages) => messages.join(" "),
                _ => "Authentication error".to_string(),
            },
            Self::Photo(err) => err.to_string(),
            Self::Validation(msg) | Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
