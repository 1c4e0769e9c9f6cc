//! Authentication extractors and session helpers.
//!
//! Provides extractors for requiring a logged-in user in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Page requests without a user are redirected to `/login`; `/api/` requests
/// get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn add_store_page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Adding a store as {}", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => {
                Redirect::to("/login?error=You%20must%20be%20logged%20in%20to%20do%20that!")
                    .into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl AuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AuthRejection::for_path(parts.uri.path()))?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// Cycles the session ID first so a pre-login session ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the logged-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
