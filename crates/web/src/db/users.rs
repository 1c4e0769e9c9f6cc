//! User repository for database operations.
//!
//! This module provides database access for users, their password hashes and
//! the stores they have hearted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// User columns plus the hearted store IDs, for queries aliasing `app_user` as `u`.
const USER_COLUMNS: &str = "u.id, u.email, u.name, u.created_at, u.updated_at, \
     ARRAY(SELECT h.store_id FROM user_heart h WHERE h.user_id = u.id \
           ORDER BY h.created_at, h.store_id) AS hearts";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    hearts: Vec<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            hearts: row.hearts.into_iter().map(StoreId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type for login lookups.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Outcome of toggling a heart.
#[derive(Debug, Clone)]
pub struct HeartToggle {
    /// Whether the store is hearted after the toggle.
    pub hearted: bool,
    /// The user with the updated hearts list.
    pub user: User,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user u WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user with email, display name and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created_at, updated_at, ARRAY[]::int4[] AS hearts
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no user has that email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, u.password_hash FROM app_user u WHERE u.email = $1");
        let row = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some((row.user.try_into()?, row.password_hash)))
    }

    /// Update a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if another user has the email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE app_user
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(name)
        .bind(email.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "email"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Heart `store` if the user hasn't yet, otherwise remove the heart.
    ///
    /// Runs in one transaction; the hearts list behaves as a set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<HeartToggle, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM user_heart WHERE user_id = $1 AND store_id = $2")
            .bind(user)
            .bind(store)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let hearted = removed == 0;
        if hearted {
            sqlx::query(
                r"
                INSERT INTO user_heart (user_id, store_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(user)
            .bind(store)
            .execute(&mut *tx)
            .await
            .map_err(super::not_found_on_foreign_key)?;
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM app_user u WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(HeartToggle {
            hearted,
            user: row.try_into()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_converts_hearts() {
        let row = UserRow {
            id: 4,
            email: "Wes@Example.com".to_string(),
            name: "Wes".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            hearts: vec![7, 2],
        };
        let user: User = row.try_into().unwrap();
        assert_eq!(user.email.as_str(), "wes@example.com");
        assert_eq!(user.hearts, vec![StoreId::new(7), StoreId::new(2)]);
        assert!(user.has_hearted(StoreId::new(2)));
        assert!(!user.has_hearted(StoreId::new(3)));
    }

    #[test]
    fn test_row_with_bad_email_is_corruption() {
        let row = UserRow {
            id: 4,
            email: "not-an-email".to_string(),
            name: "Wes".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            hearts: Vec::new(),
        };
        assert!(matches!(
            User::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
