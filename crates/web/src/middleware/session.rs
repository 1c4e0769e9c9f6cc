//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "dl_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by the migrations.
#[must_use]
pub fn create_session_layer(pool: &PgPool, config: &WebConfig) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
