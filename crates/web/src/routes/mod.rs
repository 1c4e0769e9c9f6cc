//! HTTP route handlers for the store site.
//!
//! # Route Structure
//!
//! ```text
//! # Stores
//! GET  /                       - Store listing (?page=)
//! GET  /stores                 - Store listing (?page=)
//! GET  /add                    - Add store form (requires auth)
//! POST /add                    - Create store (multipart, requires auth)
//! GET  /stores/{id}/edit       - Edit store form (owner only)
//! POST /add/{id}               - Update store (multipart, owner only)
//! GET  /store/{slug}           - Store detail with reviews
//!
//! # Browsing
//! GET  /tags                   - Tag counts and every tagged store
//! GET  /tags/{tag}             - Tag counts and stores with one tag
//! GET  /top                    - Top rated stores
//! GET  /map                    - Map page
//! GET  /hearts                 - Hearted stores (requires auth)
//!
//! # Reviews
//! POST /reviews/{id}           - Add a review (requires auth)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! GET  /register               - Register page
//! POST /register               - Register action (rate limited)
//! POST /logout                 - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account page
//! POST /account                - Update name and email
//!
//! # JSON API
//! GET  /api/search?q=          - Text search
//! GET  /api/stores/near        - Stores near ?lat=&lng=
//! POST /api/stores/{id}/heart  - Toggle heart (requires auth)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod hearts;
pub mod map;
pub mod reviews;
pub mod stores;
pub mod tags;
pub mod top;
pub mod views;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth_rate_limiter;
use crate::models::{CurrentUser, User};
use crate::services::photos::MAX_PHOTO_BYTES;
use crate::state::AppState;

/// Room for the text fields around a maximum size photo.
const FORM_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 64 * 1024;

/// Query parameters for error/success display.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Redirect to `path` with a flash message in the query string.
///
/// `kind` is `error` or `success`.
pub fn flash_redirect(path: &str, kind: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}{kind}={}",
        urlencoding::encode(message)
    ))
}

/// Send client-side failures back to `path` as a flash error; anything else
/// becomes the usual error response.
pub fn redirect_on_client_error(path: &str, err: AppError) -> Response {
    if err.status().is_client_error() && !matches!(err.status().as_u16(), 401 | 403 | 404) {
        tracing::debug!(error = %err, "form rejected");
        return flash_redirect(path, "error", &err.public_message()).into_response();
    }
    err.into_response()
}

/// Load the full record of the logged-in user, for hearts and ownership.
///
/// A session whose user was deleted is treated as logged out.
///
/// # Errors
///
/// Returns `AppError::Database` if the lookup fails.
pub async fn load_viewer(state: &AppState, user: Option<&CurrentUser>) -> Result<Option<User>> {
    match user {
        Some(user) => Ok(UserRepository::new(state.pool()).get_by_id(user.id).await?),
        None => Ok(None),
    }
}

/// Create the auth routes router.
///
/// Form submissions share one per-IP rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/add", get(stores::add_page).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/stores/{id}/edit", get(stores::edit_page))
        .route("/store/{slug}", get(stores::show))
        .route("/reviews/{id}", post(reviews::create))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

/// Create the browsing routes router.
pub fn browse_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/top", get(top::index))
        .route("/map", get(map::index))
        .route("/hearts", get(hearts::index))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::index).post(account::update))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::heart))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(browse_routes())
        .merge(auth_routes())
        .nest("/account", account_routes())
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn location(response: &Response) -> &str {
        response.headers().get("location").unwrap().to_str().unwrap()
    }

    #[test]
    fn test_flash_redirect_encodes_message() {
        let response = flash_redirect("/add", "error", "That filetype isn't allowed!").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/add?error=That%20filetype%20isn%27t%20allowed%21"
        );
    }

    #[test]
    fn test_flash_redirect_appends_to_query() {
        let response = flash_redirect("/?page=2", "success", "ok").into_response();
        assert_eq!(location(&response), "/?page=2&success=ok");
    }

    #[test]
    fn test_validation_errors_redirect_back() {
        let response =
            redirect_on_client_error("/add", AppError::Validation("You must supply a name!".into()));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/add?error=You%20must"));
    }

    #[test]
    fn test_forbidden_is_not_redirected() {
        let response = redirect_on_client_error(
            "/add",
            AppError::Forbidden("You must own a store in order to edit it!".into()),
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
