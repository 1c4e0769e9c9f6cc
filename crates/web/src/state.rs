//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;

/// Application state shared across all handlers.
///
/// Cheap to clone (one `Arc`). Repositories borrow the pool per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: PgPool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: WebConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }
}
