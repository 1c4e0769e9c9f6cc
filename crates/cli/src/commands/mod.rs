//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod stats;

use secrecy::SecretString;
use sqlx::PgPool;

use delicious_web::db;

/// Environment variable holding the database connection string.
pub const DATABASE_URL_VAR: &str = "DELICIOUS_DATABASE_URL";

/// Generic fallback, as read by the web server.
pub const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Pick the connection string: `DELICIOUS_DATABASE_URL`, then `DATABASE_URL`.
fn database_url(lookup: impl Fn(&str) -> Option<String>) -> Result<SecretString, CommandError> {
    [DATABASE_URL_VAR, FALLBACK_DATABASE_URL_VAR]
        .into_iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar(DATABASE_URL_VAR))
}

/// Connect using `DELICIOUS_DATABASE_URL` or `DATABASE_URL` (loading `.env` first).
///
/// # Errors
///
/// Returns an error if neither variable is set or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = database_url(|key| std::env::var(key).ok())?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_prefers_delicious_database_url() {
        let url = database_url(env(&[
            ("DATABASE_URL", "postgres://generic"),
            ("DELICIOUS_DATABASE_URL", "postgres://delicious"),
        ]))
        .unwrap();
        assert_eq!(url.expose_secret(), "postgres://delicious");
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let url = database_url(env(&[("DATABASE_URL", "postgres://generic")])).unwrap();
        assert_eq!(url.expose_secret(), "postgres://generic");

        let url = database_url(env(&[
            ("DELICIOUS_DATABASE_URL", "  "),
            ("DATABASE_URL", "postgres://generic"),
        ]))
        .unwrap();
        assert_eq!(url.expose_secret(), "postgres://generic");
    }

    #[test]
    fn test_missing_names_primary_variable() {
        let err = database_url(env(&[])).unwrap_err();
        assert!(matches!(err, CommandError::MissingEnvVar("DELICIOUS_DATABASE_URL")));
    }
}
