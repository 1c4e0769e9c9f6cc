//! JSON API used by the search box, the map and the heart buttons.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use delicious_core::{GeoPoint, Location, Store, StoreId};

use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::state::AppState;

/// Store fields exposed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub id: StoreId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub photo: Option<String>,
}

impl From<Store> for StoreSummary {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            slug: store.slug,
            name: store.name,
            description: store.description,
            location: store.location,
            photo: store.photo,
        }
    }
}

fn summaries(stores: Vec<Store>) -> Vec<StoreSummary> {
    stores.into_iter().map(StoreSummary::from).collect()
}

/// Query parameters for search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Query parameters for the nearby lookup.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Text search over name and description, best matches first.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StoreSummary>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let stores = StoreRepository::new(state.pool()).search(q).await?;
    Ok(Json(summaries(stores)))
}

/// Stores near a point, closest first.
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<StoreSummary>>> {
    let point =
        GeoPoint::new(query.lng, query.lat).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stores = StoreRepository::new(state.pool()).near(point).await?;
    Ok(Json(summaries(stores)))
}

/// Heart or un-heart a store; returns the user with their updated hearts.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<StoreId>,
) -> Result<Json<User>> {
    let toggled = UserRepository::new(state.pool())
        .toggle_heart(user.id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("store {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(store_id = %id, hearted = toggled.hearted, "heart toggled");
    Ok(Json(toggled.user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use delicious_core::UserId;

    #[test]
    fn test_summary_serializes_geojson_location() {
        let store = Store {
            id: StoreId::new(3),
            name: "Bagel Bar".to_string(),
            slug: "bagel-bar".to_string(),
            description: None,
            tags: vec!["Wifi".to_string()],
            created: Utc::now(),
            location: Location::point(GeoPoint::new(-79.38, 43.65).unwrap(), "1 Main St".into()),
            photo: None,
            author: UserId::new(1),
        };

        let json = serde_json::to_value(StoreSummary::from(store)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["slug"], "bagel-bar");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["location"]["coordinates"][0], -79.38);
        assert_eq!(json["location"]["coordinates"][1], 43.65);
        assert!(json.get("tags").is_none());
    }
}
