//! Store repository.
//!
//! Implements [`StoreCatalog`] for the catalog pipelines and adds the lookups
//! the pages and JSON endpoints need (by slug, by tag, text search, nearby).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::catalog::{SlugPattern, StoreCatalog};
use delicious_core::types::geo::EARTH_RADIUS_METERS;
use delicious_core::{GeoPoint, Location, Review, Store, StoreDraft, StoreId, UserId};

use super::RepositoryError;
use super::reviews::ReviewRepository;

/// Columns selected for every store query, in `StoreRow` order.
const STORE_COLUMNS: &str = "id, name, slug, description, tags, created_at, \
     location_lng, location_lat, address, photo, author_id";

/// Maximum number of text search results.
pub const SEARCH_LIMIT: i64 = 5;

/// Radius of the nearby query, in meters.
pub const NEAR_MAX_DISTANCE_METERS: f64 = 10_000.0;

/// Maximum number of nearby results.
pub const NEAR_LIMIT: i64 = 10;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    location_lng: f64,
    location_lat: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(row.location_lng, row.location_lat).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location for store {}: {e}", row.id))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            tags: row.tags,
            created: row.created_at,
            location: Location::point(point, row.address),
            photo: row.photo,
            author: UserId::new(row.author_id),
        })
    }
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

/// One page of the store listing.
#[derive(Debug, Clone)]
pub struct StorePage {
    /// Stores on this page, newest first.
    pub stores: Vec<Store>,
    /// 1-based page number.
    pub page: u32,
    /// Total number of pages (at least 1).
    pub pages: u32,
    /// Total number of stores.
    pub count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn list_page(&self, page: u32, per_page: u32) -> Result<StorePage, RepositoryError> {
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let sql = format!(
            "SELECT {STORE_COLUMNS} FROM store ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store")
            .fetch_one(self.pool)
            .await?;

        Ok(StorePage {
            stores: into_stores(rows)?,
            page,
            pages: page_count(count, per_page),
            count,
        })
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored location is invalid.
    pub async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE id = $1");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a store by its exact slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored location is invalid.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE slug = $1");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Stores carrying `tag`, or every store with at least one tag when `tag` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn find_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows = match tag {
            Some(tag) => {
                let sql = format!(
                    "SELECT {STORE_COLUMNS} FROM store WHERE $1 = ANY(tags) ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, StoreRow>(&sql)
                    .bind(tag)
                    .fetch_all(self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {STORE_COLUMNS} FROM store WHERE cardinality(tags) > 0 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, StoreRow>(&sql)
                    .fetch_all(self.pool)
                    .await?
            }
        };

        into_stores(rows)
    }

    /// Stores with the given IDs, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn find_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(StoreId::as_i32).collect();

        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE id = ANY($1) ORDER BY name");
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }

    /// Full-text search over name and description, best match first.
    ///
    /// Uses `websearch_to_tsquery`, so quoted phrases and `-term` work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn search(&self, query: &str) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM store, websearch_to_tsquery('english', $1) AS q
            WHERE to_tsvector('english', name || ' ' || coalesce(description, '')) @@ q
            ORDER BY ts_rank(to_tsvector('english', name || ' ' || coalesce(description, '')), q) DESC
            LIMIT $2
            "
        );
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(query)
            .bind(SEARCH_LIMIT)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }

    /// Stores within [`NEAR_MAX_DISTANCE_METERS`] of `point`, closest first.
    ///
    /// Distance is great-circle (haversine) on a spherical Earth.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn near(&self, point: GeoPoint) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM (
                SELECT *,
                       2 * $3::float8 * asin(least(1.0, sqrt(
                           power(sin(radians(location_lat - $2::float8) / 2), 2)
                           + cos(radians($2::float8)) * cos(radians(location_lat))
                             * power(sin(radians(location_lng - $1::float8) / 2), 2)
                       ))) AS distance
                FROM store
            ) AS s
            WHERE distance <= $4::float8
            ORDER BY distance
            LIMIT $5
            "
        );
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(point.lng)
            .bind(point.lat)
            .bind(EARTH_RADIUS_METERS)
            .bind(NEAR_MAX_DISTANCE_METERS)
            .bind(NEAR_LIMIT)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }
}

impl StoreCatalog for StoreRepository<'_> {
    type Error = RepositoryError;

    async fn find_stores_by_slug_pattern(
        &self,
        pattern: &SlugPattern,
    ) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE slug ~* $1");
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(pattern.as_str())
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }

    async fn find_all_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store ORDER BY id");
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }

    async fn find_reviews_by_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        ReviewRepository::new(self.pool).for_store(store).await
    }

    async fn find_reviews_by_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<Review>, RepositoryError> {
        ReviewRepository::new(self.pool).for_stores(stores).await
    }

    async fn save_store(&self, draft: StoreDraft) -> Result<Store, RepositoryError> {
        let row = match draft.id {
            None => {
                let sql = format!(
                    r"
                    INSERT INTO store (name, slug, description, tags, created_at,
                                       location_lng, location_lat, address, photo, author_id)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    RETURNING {STORE_COLUMNS}
                    "
                );
                sqlx::query_as::<_, StoreRow>(&sql)
                    .bind(&draft.name)
                    .bind(&draft.slug)
                    .bind(&draft.description)
                    .bind(&draft.tags)
                    .bind(draft.created)
                    .bind(draft.location.coordinates.lng)
                    .bind(draft.location.coordinates.lat)
                    .bind(&draft.location.address)
                    .bind(&draft.photo)
                    .bind(draft.author)
                    .fetch_one(self.pool)
                    .await
                    .map_err(super::not_found_on_foreign_key)?
            }
            Some(id) => {
                let sql = format!(
                    r"
                    UPDATE store
                    SET name = $2, slug = $3, description = $4, tags = $5,
                        location_lng = $6, location_lat = $7, address = $8, photo = $9
                    WHERE id = $1
                    RETURNING {STORE_COLUMNS}
                    "
                );
                sqlx::query_as::<_, StoreRow>(&sql)
                    .bind(id)
                    .bind(&draft.name)
                    .bind(&draft.slug)
                    .bind(&draft.description)
                    .bind(&draft.tags)
                    .bind(draft.location.coordinates.lng)
                    .bind(draft.location.coordinates.lat)
                    .bind(&draft.location.address)
                    .bind(&draft.photo)
                    .fetch_optional(self.pool)
                    .await?
                    .ok_or(RepositoryError::NotFound)?
            }
        };

        row.try_into()
    }
}

/// Number of pages needed for `count` items, never less than one.
fn page_count(count: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (count.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}
