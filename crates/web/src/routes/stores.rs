//! Store listing, detail and add/edit route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use delicious_core::catalog::StoreService;
use delicious_core::{Store, StoreId, StoreInput};

use super::views::{PageContext, StoreCard, StoreFormView, can_edit, photo_url};
use super::{MessageQuery, flash_redirect, load_viewer, redirect_on_client_error};
use crate::db::reviews::{AuthoredReview, ReviewRepository};
use crate::db::{RepositoryError, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentUser;
use crate::services::{PhotoUpload, remove_photo, store_photo};
use crate::state::AppState;

/// Stores per listing page.
pub const STORES_PER_PAGE: u32 = 6;

/// Message shown when someone other than the author tries to edit.
pub const NOT_OWNER_MESSAGE: &str = "You must own a store in order to edit it!";

// =============================================================================
// Query and Form Types
// =============================================================================

/// Query parameters for the listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// A parsed add/edit submission.
#[derive(Debug, Default)]
pub struct StoreSubmission {
    pub input: StoreInput,
    pub photo: Option<PhotoUpload>,
}

// =============================================================================
// Templates
// =============================================================================

/// Store listing template (also used for hearted stores).
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresTemplate {
    pub page: PageContext,
    pub heading: String,
    pub stores: Vec<StoreCard>,
    pub pagination: Option<Pagination>,
}

/// Previous/next links for the listing.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub count: i64,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, pages: u32, count: i64) -> Self {
        Self {
            page,
            pages,
            count,
            prev: (page > 1).then(|| page - 1),
            next: (page < pages).then(|| page + 1),
        }
    }
}

/// Add/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/edit.html")]
pub struct EditStoreTemplate {
    pub page: PageContext,
    pub form: StoreFormView,
}

/// A review as shown on the store page.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author_name: String,
    pub stars: String,
    pub text: String,
    pub created: String,
}

impl From<AuthoredReview> for ReviewView {
    fn from(authored: AuthoredReview) -> Self {
        let rating = usize::from(authored.review.rating.get());
        Self {
            author_name: authored.author_name,
            stars: format!("{}{}", "★".repeat(rating), "☆".repeat(5 - rating)),
            text: authored.review.text,
            created: authored.review.created.format("%B %e, %Y").to_string(),
        }
    }
}

/// Store detail template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreTemplate {
    pub page: PageContext,
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: String,
    pub tags: Vec<String>,
    pub photo_url: Option<String>,
    pub editable: bool,
    pub logged_in: bool,
    pub reviews: Vec<ReviewView>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Read the multipart add/edit form.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed body or non-numeric coordinates.
pub async fn read_submission(mut multipart: Multipart) -> Result<StoreSubmission> {
    let mut submission = StoreSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "photo" {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let has_file = field.file_name().is_some_and(|f| !f.is_empty());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if has_file && !bytes.is_empty() {
                submission.photo = Some(PhotoUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        apply_field(&mut submission.input, &name, value)?;
    }

    Ok(submission)
}

/// Copy one text field into the input.
fn apply_field(input: &mut StoreInput, name: &str, value: String) -> Result<()> {
    match name {
        "name" => input.name = value,
        "description" => input.description = Some(value).filter(|d| !d.trim().is_empty()),
        "tags" => input.tags.push(value),
        "address" | "location[address]" => {
            input.address = Some(value).filter(|a| !a.trim().is_empty());
        }
        "lng" | "location[coordinates][0]" => input.lng = parse_coordinate(&value)?,
        "lat" | "location[coordinates][1]" => input.lat = parse_coordinate(&value)?,
        _ => {}
    }
    Ok(())
}

fn parse_coordinate(value: &str) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation("Coordinates must be numbers!".to_string()))
}

/// Validate, then store the photo if one came with the submission.
///
/// Validation runs first so an invalid form never writes a photo. A save that
/// fails afterwards is cleaned up by [`discard_unsaved_photo`].
async fn prepare_input(state: &AppState, submission: StoreSubmission) -> Result<StoreInput> {
    let StoreSubmission { mut input, photo } = submission;
    input
        .clone()
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if let Some(upload) = photo {
        input.photo = Some(store_photo(&state.config().uploads_dir, upload).await?);
    }
    Ok(input)
}

/// Redirect to the last page when `requested` is beyond it.
///
/// An empty catalog still has one (empty) page.
fn past_the_end(requested: u32, pages: u32) -> Option<Redirect> {
    let last = pages.max(1);
    (requested > last).then(|| {
        let message = format!(
            "Hey! You asked for page {requested}. But that doesn't exist. So I put you on page {last}"
        );
        flash_redirect(&format!("/stores?page={last}"), "error", &message)
    })
}

/// Delete the photo written for a submission whose save failed.
async fn discard_unsaved_photo<T>(
    dir: &std::path::Path,
    photo: Option<&str>,
    saved: Result<T>,
) -> Result<T> {
    let orphan = if saved.is_err() { photo } else { None };
    if let Some(filename) = orphan {
        if let Err(e) = remove_photo(dir, filename).await {
            tracing::warn!(photo = %filename, error = %e, "failed to remove unsaved photo");
        }
    }
    saved
}

/// Fetch a store the user is allowed to edit.
async fn owned_store(state: &AppState, id: StoreId, user: &CurrentUser) -> Result<Store> {
    let store = StoreRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;

    if !store.is_owned_by(user.id) {
        return Err(AppError::Forbidden(NOT_OWNER_MESSAGE.to_string()));
    }
    Ok(store)
}

// =============================================================================
// Listing and Detail
// =============================================================================

/// Display one page of stores, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let requested = query.page.unwrap_or(1).max(1);
    let listing = StoreRepository::new(state.pool())
        .list_page(requested, STORES_PER_PAGE)
        .await?;

    if let Some(redirect) = past_the_end(requested, listing.pages) {
        return Ok(redirect.into_response());
    }

    let viewer = load_viewer(&state, user.as_ref()).await?;
    let flash = MessageQuery {
        error: query.error,
        success: query.success,
    };

    Ok(StoresTemplate {
        page: PageContext::new("Stores", user, flash),
        heading: "Stores".to_string(),
        stores: StoreCard::many(&listing.stores, viewer.as_ref()),
        pagination: Some(Pagination::new(listing.page, listing.pages, listing.count)),
    }
    .into_response())
}

/// Display a single store with its reviews.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let store = StoreRepository::new(state.pool())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    let reviews = ReviewRepository::new(state.pool())
        .for_store_with_authors(store.id)
        .await?;

    Ok(StoreTemplate {
        id: store.id.as_i32(),
        editable: can_edit(store.author, user.as_ref()),
        logged_in: user.is_some(),
        page: PageContext::new(store.name.clone(), user, flash),
        name: store.name,
        slug: store.slug,
        description: store.description.unwrap_or_default(),
        address: store.location.address,
        tags: store.tags,
        photo_url: photo_url(store.photo.as_deref()),
        reviews: reviews.into_iter().map(ReviewView::from).collect(),
    })
}

// =============================================================================
// Add and Edit
// =============================================================================

/// Display the add store form.
pub async fn add_page(
    RequireAuth(user): RequireAuth,
    Query(flash): Query<MessageQuery>,
) -> impl IntoResponse {
    EditStoreTemplate {
        page: PageContext::new("Add Store", Some(user), flash),
        form: StoreFormView::blank(),
    }
}

/// Handle the add store form.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Response {
    let result = async {
        let input = prepare_input(&state, read_submission(multipart).await?).await?;
        let photo = input.photo.clone();
        let repo = StoreRepository::new(state.pool());
        let saved = StoreService::new(&repo)
            .create(input, user.id)
            .await
            .map_err(AppError::from);
        discard_unsaved_photo(&state.config().uploads_dir, photo.as_deref(), saved).await
    }
    .await;

    match result {
        Ok(store) => flash_redirect(
            &format!("/store/{}", store.slug),
            "success",
            &format!("Successfully created {}. Care to leave a review?", store.name),
        )
        .into_response(),
        Err(err) => redirect_on_client_error("/add", err),
    }
}

/// Display the edit form for a store the user owns.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<StoreId>,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let store = owned_store(&state, id, &user).await?;

    Ok(EditStoreTemplate {
        page: PageContext::new(format!("Edit {}", store.name), Some(user), flash),
        form: StoreFormView::for_store(&store),
    })
}

/// Handle the edit form.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<StoreId>,
    multipart: Multipart,
) -> Response {
    let edit_path = format!("/stores/{id}/edit");

    let result = async {
        let existing = owned_store(&state, id, &user).await?;
        let input = prepare_input(&state, read_submission(multipart).await?).await?;
        let photo = input.photo.clone();
        let repo = StoreRepository::new(state.pool());
        let saved = StoreService::new(&repo)
            .update(&existing, input)
            .await
            .map_err(AppError::from);
        discard_unsaved_photo(&state.config().uploads_dir, photo.as_deref(), saved).await
    }
    .await;

    match result {
        Ok(store) => flash_redirect(
            &edit_path,
            "success",
            &format!("Successfully updated {}.", store.name),
        )
        .into_response(),
        Err(AppError::Database(RepositoryError::NotFound)) => {
            AppError::NotFound(format!("store {id}")).into_response()
        }
        Err(err) => redirect_on_client_error(&edit_path, err),
    }
}
