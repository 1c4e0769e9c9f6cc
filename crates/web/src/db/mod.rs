//! Database operations for the site's `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `app_user` - Accounts (email, display name, Argon2 password hash)
//! - `store` - Store listings, one row per store, location as lng/lat columns
//! - `review` - Ratings and text, each referencing one store and one author
//! - `user_heart` - Stores a user has hearted
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p delicious-cli -- migrate
//! ```

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use reviews::ReviewRepository;
pub use stores::{StorePage, StoreRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `RepositoryError::Conflict`.
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Map a foreign key violation (missing referenced row) to `RepositoryError::NotFound`.
fn not_found_on_foreign_key(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(err)
}
