//! Catalog statistics from the command line.
//!
//! # Usage
//!
//! ```bash
//! dl-cli stats tags
//! dl-cli stats top
//! ```

use tracing::info;

use delicious_core::catalog::{tag_list, top_stores};
use delicious_web::db::{RepositoryError, StoreRepository};

use super::CommandError;

/// Errors from the stats commands.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Log every tag with its store count, most used first.
///
/// # Errors
///
/// Returns an error if the connection or the store query fails.
pub async fn tags() -> Result<(), StatsError> {
    let pool = super::connect().await?;
    let counts = tag_list(&StoreRepository::new(&pool)).await?;

    info!("Tags");
    info!("====");
    for count in &counts {
        info!("  {}: {}", count.tag, count.count);
    }
    if counts.is_empty() {
        info!("  (no tagged stores)");
    }
    Ok(())
}

/// Log the top rated stores.
///
/// # Errors
///
/// Returns an error if the connection or a query fails.
pub async fn top() -> Result<(), StatsError> {
    let pool = super::connect().await?;
    let ranked = top_stores(&StoreRepository::new(&pool)).await?;

    info!("Top Stores");
    info!("==========");
    for (i, store) in ranked.iter().enumerate() {
        info!(
            "  {}. {} ({}) - {:.1} from {} reviews",
            i + 1,
            store.name,
            store.slug,
            store.average_rating,
            store.reviews.len()
        );
    }
    if ranked.is_empty() {
        info!("  (no store has enough reviews yet)");
    }
    Ok(())
}
