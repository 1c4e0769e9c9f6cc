//! Authentication route handlers.
//!
//! Password login, registration and logout. A successful registration logs
//! the new user straight in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::PageContext;
use super::{MessageQuery, flash_redirect};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put `user` in the session and tag Sentry events with them.
async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::new("Login", user, flash),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("login failed");
            return flash_redirect("/login", "error", "Failed Login!").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    if let Err(e) = start_session(&session, &user).await {
        return e.into_response();
    }

    tracing::info!(user_id = %user.id, "user logged in");
    flash_redirect("/", "success", "You are now logged in!").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::new("Register", user, flash),
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<Registration>,
) -> Response {
    let user = match AuthService::new(state.pool()).register(form).await {
        Ok(user) => user,
        Err(e @ (AuthError::Invalid(_) | AuthError::UserAlreadyExists)) => {
            let message = AppError::from(e).public_message();
            return flash_redirect("/register", "error", &message).into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    if let Err(e) = start_session(&session, &user).await {
        return e.into_response();
    }

    flash_redirect("/", "success", "You are now logged in!").into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/?success=You%20are%20now%20logged%20out!").into_response()
}
