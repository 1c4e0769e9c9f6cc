//! Account route handlers.
//!
//! All routes in this module require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::PageContext;
use super::{MessageQuery, flash_redirect, redirect_on_client_error};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Account form data.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
}

/// Display the account page.
pub async fn index(
    RequireAuth(user): RequireAuth,
    Query(flash): Query<MessageQuery>,
) -> impl IntoResponse {
    AccountTemplate {
        name: user.name.clone(),
        email: user.email.to_string(),
        page: PageContext::new("Edit Your Account", Some(user), flash),
    }
}

/// Update the user's name and email.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AccountForm>,
) -> Response {
    let updated = match AuthService::new(state.pool())
        .update_account(user.id, &form.name, &form.email)
        .await
    {
        Ok(updated) => updated,
        Err(e) => return redirect_on_client_error("/account", AppError::from(e)),
    };

    let refreshed: Result<()> = set_current_user(&session, &CurrentUser::from(&updated))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")));
    if let Err(e) = refreshed {
        return e.into_response();
    }

    flash_redirect("/account", "success", "Updated the profile!").into_response()
}
