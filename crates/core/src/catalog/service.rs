//! Validate-then-save pipeline for store writes.
//!
//! Both paths run the same steps in order, each able to stop the write:
//!
//! 1. validate the submitted fields
//! 2. assign a slug (create: always; update: only when the name changed)
//! 3. save through the catalog

use chrono::Utc;

use super::CatalogError;
use super::repository::StoreCatalog;
use super::slug::SlugAssigner;
use crate::types::{Store, StoreDraft, StoreInput, UserId};

/// Creates and updates stores against a [`StoreCatalog`].
pub struct StoreService<'a, C> {
    catalog: &'a C,
}

impl<'a, C: StoreCatalog> StoreService<'a, C> {
    /// Create a service writing through `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Create a new store owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for bad input (nothing is read or
    /// written), or `CatalogError::Repository` if the slug lookup or the save
    /// fails.
    pub async fn create(
        &self,
        input: StoreInput,
        author: UserId,
    ) -> Result<Store, CatalogError<C::Error>> {
        let fields = input.validate()?;

        let mut draft = StoreDraft {
            id: None,
            name: fields.name,
            slug: String::new(),
            description: fields.description,
            tags: fields.tags,
            created: Utc::now(),
            location: fields.location,
            photo: fields.photo,
            author,
        };
        SlugAssigner::new(self.catalog).assign(&mut draft, None).await?;

        let store = self
            .catalog
            .save_store(draft)
            .await
            .map_err(CatalogError::Repository)?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "store created");
        Ok(store)
    }

    /// Apply an edit to `existing`.
    ///
    /// Author and creation time never change. The photo is replaced only when
    /// the submission carries a new one. The slug is recomputed only if the
    /// trimmed name differs from the stored name.
    ///
    /// # Errors
    ///
    /// Same as [`StoreService::create`].
    pub async fn update(
        &self,
        existing: &Store,
        input: StoreInput,
    ) -> Result<Store, CatalogError<C::Error>> {
        let fields = input.validate()?;

        let mut draft = existing.to_draft();
        draft.name = fields.name;
        draft.description = fields.description;
        draft.tags = fields.tags;
        draft.location = fields.location;
        if let Some(photo) = fields.photo {
            draft.photo = Some(photo);
        }

        let renamed = SlugAssigner::new(self.catalog)
            .assign(&mut draft, Some(&existing.name))
            .await?;

        let store = self
            .catalog
            .save_store(draft)
            .await
            .map_err(CatalogError::Repository)?;
        tracing::info!(store_id = %store.id, renamed, slug = %store.slug, "store updated");
        Ok(store)
    }
}
