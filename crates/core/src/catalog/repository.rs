//! The persistence seam the catalog logic runs against.

use std::future::Future;

use super::slug::SlugPattern;
use crate::types::{Review, Store, StoreDraft, StoreId};

/// Read/write access to stores and their reviews.
///
/// Implemented by the Postgres repositories in the web crate and by in-memory
/// fakes in tests. Methods return `Send` futures so callers can hold an
/// implementation inside axum handlers.
pub trait StoreCatalog: Sync {
    /// Error produced by the backing store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores whose slug matches `pattern`, ignoring case.
    fn find_stores_by_slug_pattern(
        &self,
        pattern: &SlugPattern,
    ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send;

    /// Every store.
    fn find_all_stores(&self) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send;

    /// Reviews referencing `store`.
    fn find_reviews_by_store(
        &self,
        store: StoreId,
    ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send;

    /// Insert (`draft.id == None`) or update a store, returning the saved row.
    fn save_store(
        &self,
        draft: StoreDraft,
    ) -> impl Future<Output = Result<Store, Self::Error>> + Send;

    /// Reviews referencing any of `stores`.
    ///
    /// The default asks for each store in turn; backends that can answer in
    /// one round trip should override it.
    fn find_reviews_by_stores(
        &self,
        stores: &[StoreId],
    ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send {
        async move {
            let mut reviews = Vec::new();
            for &store in stores {
                reviews.extend(self.find_reviews_by_store(store).await?);
            }
            Ok(reviews)
        }
    }
}
