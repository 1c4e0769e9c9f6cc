//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{Rating, Review, ReviewId, StoreId, UserId};

use super::RepositoryError;

const REVIEW_COLUMNS: &str = "r.id, r.store_id, r.author_id, r.rating, r.body, r.created_at";

/// Internal row type for `PostgreSQL` review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    store_id: i32,
    author_id: i32,
    rating: i16,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating on review {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            store: StoreId::new(row.store_id),
            author: UserId::new(row.author_id),
            rating,
            text: row.body,
            created: row.created_at,
        })
    }
}

/// Row type for reviews joined with their author's name.
#[derive(Debug, sqlx::FromRow)]
struct AuthoredReviewRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_name: String,
}

/// A review together with its author's display name.
#[derive(Debug, Clone)]
pub struct AuthoredReview {
    /// The review.
    pub review: Review,
    /// Display name of the author.
    pub author_name: String,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a review to a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or author doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store: StoreId,
        author: UserId,
        rating: Rating,
        text: &str,
    ) -> Result<Review, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO review AS r (store_id, author_id, rating, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(store)
            .bind(author)
            .bind(i16::from(rating.get()))
            .bind(text)
            .fetch_one(self.pool)
            .await
            .map_err(super::not_found_on_foreign_key)?;

        row.try_into()
    }

    /// Reviews of one store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    pub async fn for_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review r WHERE r.store_id = $1 ORDER BY r.created_at, r.id"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(store)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Reviews of any of `stores` in a single query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    pub async fn for_stores(&self, stores: &[StoreId]) -> Result<Vec<Review>, RepositoryError> {
        if stores.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = stores.iter().map(StoreId::as_i32).collect();

        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review r WHERE r.store_id = ANY($1) ORDER BY r.created_at, r.id"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Reviews of one store with author names, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    pub async fn for_store_with_authors(
        &self,
        store: StoreId,
    ) -> Result<Vec<AuthoredReview>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}, u.name AS author_name
            FROM review r
            JOIN app_user u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "
        );
        let rows = sqlx::query_as::<_, AuthoredReviewRow>(&sql)
            .bind(store)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AuthoredReview {
                    review: row.review.try_into()?,
                    author_name: row.author_name,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(rating: i16) -> ReviewRow {
        ReviewRow {
            id: 1,
            store_id: 2,
            author_id: 3,
            rating,
            body: "Great bagels".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_review() {
        let review: Review = row(4).try_into().unwrap();
        assert_eq!(review.store, StoreId::new(2));
        assert_eq!(review.author, UserId::new(3));
        assert_eq!(review.rating.get(), 4);
        assert_eq!(review.text, "Great bagels");
    }

    #[test]
    fn test_out_of_range_rating_is_corruption() {
        assert!(matches!(
            Review::try_from(row(9)),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
