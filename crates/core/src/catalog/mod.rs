//! Catalog logic: slugs, tag counts and top-store ranking.
//!
//! Everything here runs against the [`StoreCatalog`] trait and does no I/O of
//! its own. The aggregations are plain functions over loaded data so they can
//! be tested without a database.

pub mod ranking;
pub mod repository;
pub mod service;
pub mod slug;
pub mod tags;

#[cfg(test)]
pub(crate) mod testing;

pub use ranking::{MIN_REVIEWS, TOP_STORES_LIMIT, TopStore, rank_top_stores, top_stores};
pub use repository::StoreCatalog;
pub use service::StoreService;
pub use slug::{SlugAssigner, SlugPattern, slugify};
pub use tags::{TagCount, count_tags, tag_list};

use crate::types::StoreValidationError;

/// Errors from catalog writes.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError<E> {
    /// The submitted store was invalid. Nothing was read or written.
    #[error(transparent)]
    Validation(#[from] StoreValidationError),

    /// A base slug did not form a valid match pattern.
    #[error("invalid slug pattern: {0}")]
    SlugPattern(#[from] regex::Error),

    /// The catalog backend failed.
    #[error("catalog error: {0}")]
    Repository(#[source] E),
}
