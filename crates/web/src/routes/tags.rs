//! Tag browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use delicious_core::catalog::{TagCount, tag_list};

use super::MessageQuery;
use super::views::{PageContext, StoreCard};
use crate::db::StoreRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// A tag link with its store count.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub tag: String,
    pub count: usize,
    pub active: bool,
}

/// Tag browser template.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub page: PageContext,
    pub tags: Vec<TagLink>,
    pub stores: Vec<StoreCard>,
}

fn tag_links(counts: Vec<TagCount>, active: Option<&str>) -> Vec<TagLink> {
    counts
        .into_iter()
        .map(|c| TagLink {
            active: active == Some(c.tag.as_str()),
            tag: c.tag,
            count: c.count,
        })
        .collect()
}

/// Every tag, and every store with at least one tag.
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    render(&state, auth, None, flash).await
}

/// Every tag, and the stores carrying `tag`.
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(tag): Path<String>,
    Query(flash): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    render(&state, auth, Some(tag), flash).await
}

#[instrument(skip(state, user, flash))]
async fn render(
    state: &AppState,
    OptionalAuth(user): OptionalAuth,
    tag: Option<String>,
    flash: MessageQuery,
) -> Result<TagsTemplate> {
    let repo = StoreRepository::new(state.pool());

    let (counts, stores) = tokio::try_join!(tag_list(&repo), repo.find_by_tag(tag.as_deref()))?;
    let viewer = super::load_viewer(state, user.as_ref()).await?;

    let title = tag.clone().unwrap_or_else(|| "Tags".to_string());
    Ok(TagsTemplate {
        page: PageContext::new(title, user, flash),
        tags: tag_links(counts, tag.as_deref()),
        stores: StoreCard::many(&stores, viewer.as_ref()),
    })
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_links_mark_active() {
        let counts = vec![
            TagCount {
                tag: "Wifi".to_string(),
                count: 3,
            },
            TagCount {
                tag: "Licensed".to_string(),
                count: 1,
            },
        ];
        let links = tag_links(counts, Some("Licensed"));
        assert!(!links[0].active);
        assert!(links[1].active);
        assert_eq!(links[0].count, 3);
    }
}
