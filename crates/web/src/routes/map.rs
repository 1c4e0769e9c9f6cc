//! Map page.
//!
//! The page itself is static; markers come from `/api/stores/near`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use super::MessageQuery;
use super::views::PageContext;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub page: PageContext,
    /// Browser key for the map tiles, when configured.
    pub map_key: Option<String>,
}

/// Display the map.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<MessageQuery>,
) -> impl IntoResponse {
    MapTemplate {
        page: PageContext::new("Map", user, flash),
        map_key: state.config().map_key.clone(),
    }
}
