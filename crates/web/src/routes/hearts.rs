//! Hearted stores page.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use super::MessageQuery;
use super::stores::StoresTemplate;
use super::views::{PageContext, StoreCard};
use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Display the stores the user has hearted.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let viewer = super::load_viewer(&state, Some(&user))
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    let stores = StoreRepository::new(state.pool())
        .find_by_ids(&viewer.hearts)
        .await?;

    Ok(StoresTemplate {
        page: PageContext::new("Hearted Stores", Some(user), flash),
        heading: "Hearted Stores".to_string(),
        stores: StoreCard::many(&stores, Some(&viewer)),
        pagination: None,
    })
}
