//! Top-rated stores.
//!
//! The ranking is a small pipeline over stores and reviews:
//! join reviews onto their store, keep stores with at least
//! [`MIN_REVIEWS`] reviews, average the ratings, sort best first and keep
//! [`TOP_STORES_LIMIT`].

use std::collections::HashMap;

use serde::Serialize;

use super::repository::StoreCatalog;
use crate::types::{Review, Store, StoreId};

/// Stores need at least this many reviews to be ranked.
pub const MIN_REVIEWS: usize = 2;

/// Maximum number of ranked stores returned.
pub const TOP_STORES_LIMIT: usize = 10;

/// A ranked store summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStore {
    /// Photo filename.
    pub photo: Option<String>,
    /// Store name.
    pub name: String,
    /// The store's reviews.
    pub reviews: Vec<Review>,
    /// Store slug, for linking.
    pub slug: String,
    /// Mean rating across `reviews`.
    pub average_rating: f64,
}

/// Group reviews under the store they reference.
///
/// Reviews pointing at a store not in `stores` are dropped; stores without
/// reviews get an empty list.
#[must_use]
pub fn join_reviews(stores: Vec<Store>, reviews: Vec<Review>) -> Vec<(Store, Vec<Review>)> {
    let mut by_store: HashMap<StoreId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review);
    }

    stores
        .into_iter()
        .map(|store| {
            let reviews = by_store.remove(&store.id).unwrap_or_default();
            (store, reviews)
        })
        .collect()
}

/// Arithmetic mean of the ratings, `None` for no reviews.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating.get())).sum();
    #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
    let len = reviews.len() as f64;
    Some(f64::from(total) / len)
}

/// Rank joined stores: filter, average, sort descending, truncate.
#[must_use]
pub fn rank(joined: Vec<(Store, Vec<Review>)>) -> Vec<TopStore> {
    let mut ranked: Vec<TopStore> = joined
        .into_iter()
        .filter(|(_, reviews)| reviews.len() >= MIN_REVIEWS)
        .filter_map(|(store, reviews)| {
            let average_rating = average_rating(&reviews)?;
            Some(TopStore {
                photo: store.photo,
                name: store.name,
                reviews,
                slug: store.slug,
                average_rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranked.truncate(TOP_STORES_LIMIT);
    ranked
}

/// Join and rank in one step.
#[must_use]
pub fn rank_top_stores(stores: Vec<Store>, reviews: Vec<Review>) -> Vec<TopStore> {
    rank(join_reviews(stores, reviews))
}

/// The best-reviewed stores in the catalog.
///
/// # Errors
///
/// Propagates the catalog's error if loading stores or reviews fails.
pub async fn top_stores<C: StoreCatalog>(catalog: &C) -> Result<Vec<TopStore>, C::Error> {
    let stores = catalog.find_all_stores().await?;
    let ids: Vec<StoreId> = stores.iter().map(|s| s.id).collect();
    let reviews = catalog.find_reviews_by_stores(&ids).await?;

    let ranked = rank_top_stores(stores, reviews);
    tracing::debug!(ranked = ranked.len(), "ranked top stores");
    Ok(ranked)
}
