//! Top rated stores page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use delicious_core::catalog::{TopStore, top_stores};

use super::MessageQuery;
use super::views::{PageContext, photo_url};
use crate::db::StoreRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// One row of the ranking table.
#[derive(Debug, Clone)]
pub struct RankedRow {
    pub position: usize,
    pub name: String,
    pub slug: String,
    pub photo_url: Option<String>,
    pub review_count: usize,
    pub average: String,
}

impl RankedRow {
    fn new(position: usize, store: TopStore) -> Self {
        Self {
            position,
            review_count: store.reviews.len(),
            average: format!("{:.1}", store.average_rating),
            photo_url: photo_url(store.photo.as_deref()),
            name: store.name,
            slug: store.slug,
        }
    }
}

/// Top stores template.
#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopTemplate {
    pub page: PageContext,
    pub rows: Vec<RankedRow>,
}

/// Display the best-reviewed stores.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let ranked = top_stores(&StoreRepository::new(state.pool())).await?;
    let rows = ranked
        .into_iter()
        .enumerate()
        .map(|(i, store)| RankedRow::new(i + 1, store))
        .collect();

    Ok(TopTemplate {
        page: PageContext::new("Top Stores!", user, flash),
        rows,
    })
}
