//! Review submission.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use delicious_core::{Rating, StoreId};

use super::{flash_redirect, redirect_on_client_error};
use crate::db::{ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl ReviewForm {
    /// Check the form, returning the rating and trimmed text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a missing or out-of-range rating or blank text.
    pub fn validate(&self) -> Result<(Rating, String)> {
        let rating = self
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<i64>().ok())
            .ok_or_else(|| AppError::Validation("You must pick a rating!".to_string()))?;
        let rating = Rating::new(rating).map_err(|e| AppError::Validation(e.to_string()))?;

        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Your review needs some text!".to_string()));
        }

        Ok((rating, text.to_owned()))
    }
}

/// Add a review to a store.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<StoreId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;
    let store_path = format!("/store/{}", store.slug);

    let (rating, text) = match form.validate() {
        Ok(valid) => valid,
        Err(err) => return Ok(redirect_on_client_error(&store_path, err)),
    };

    let review = ReviewRepository::new(state.pool())
        .create(store.id, user.id, rating, &text)
        .await?;
    tracing::info!(review_id = %review.id, store_id = %store.id, "review saved");

    Ok(flash_redirect(&store_path, "success", "Review Saved!").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(rating: Option<&str>, text: &str) -> ReviewForm {
        ReviewForm {
            rating: rating.map(String::from),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_valid_review() {
        let (rating, text) = form(Some("4"), "  Lovely croissants ").validate().unwrap();
        assert_eq!(rating.get(), 4);
        assert_eq!(text, "Lovely croissants");
    }

    #[test]
    fn test_rating_required_and_in_range() {
        assert!(form(None, "ok").validate().is_err());
        assert!(form(Some("zero"), "ok").validate().is_err());
        assert!(form(Some("0"), "ok").validate().is_err());
        assert!(form(Some("6"), "ok").validate().is_err());
        assert!(form(Some("5"), "ok").validate().is_ok());
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = form(Some("3"), "   ").validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
