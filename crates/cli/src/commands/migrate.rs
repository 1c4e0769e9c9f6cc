//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dl-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DELICIOUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/web/migrations/` and are embedded at build time.

use thiserror::Error;

use super::CommandError;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Could not connect.
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the connection fails or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
