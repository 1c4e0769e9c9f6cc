//! Store listings.
//!
//! Three shapes cover a store's life:
//!
//! - [`StoreInput`] is whatever the add/edit form (or a seed file) submitted.
//! - [`StoreFields`] is that input after validation: trimmed name, required
//!   location, de-duplicated tags.
//! - [`StoreDraft`] is what gets handed to persistence: validated fields plus
//!   slug, author and timestamp, with an ID only when updating.
//!
//! [`Store`] is the persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::{GeoError, GeoPoint, Location};
use super::id::{StoreId, UserId};

/// Reasons a submitted store is rejected before any read or write.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreValidationError {
    /// Name missing or blank.
    #[error("Please enter a store name!")]
    MissingName,
    /// Address missing or blank.
    #[error("You must supply an address!")]
    MissingAddress,
    /// Longitude or latitude missing.
    #[error("You must supply coordinates!")]
    MissingCoordinates,
    /// Coordinates present but not a valid position.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] GeoError),
}

/// Raw store fields as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreInput {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Selected tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Longitude.
    #[serde(default)]
    pub lng: Option<f64>,
    /// Latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Stored photo filename, when a photo was uploaded with this submission.
    #[serde(default)]
    pub photo: Option<String>,
}

impl StoreInput {
    /// Validate and normalize the submission.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreValidationError` found, checking name, then
    /// address, then coordinates.
    pub fn validate(self) -> Result<StoreFields, StoreValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreValidationError::MissingName);
        }

        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(StoreValidationError::MissingAddress)?;

        let (Some(lng), Some(lat)) = (self.lng, self.lat) else {
            return Err(StoreValidationError::MissingCoordinates);
        };
        let coordinates = GeoPoint::new(lng, lat)?;

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }

        Ok(StoreFields {
            name: name.to_owned(),
            description,
            tags,
            location: Location::point(coordinates, address.to_owned()),
            photo: self.photo.filter(|p| !p.is_empty()),
        })
    }
}

/// Validated, user-editable store fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFields {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed description, `None` when blank.
    pub description: Option<String>,
    /// Tags in submission order, without blanks or repeats.
    pub tags: Vec<String>,
    /// Point location with address.
    pub location: Location,
    /// Newly uploaded photo, if any.
    pub photo: Option<String>,
}

/// A store ready to be saved. `id` is `None` for a new store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDraft {
    /// Existing ID when updating.
    pub id: Option<StoreId>,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Description.
    pub description: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Location.
    pub location: Location,
    /// Photo filename.
    pub photo: Option<String>,
    /// Owning user.
    pub author: UserId,
}

/// A persisted store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// Unique (case-insensitive) URL slug.
    pub slug: String,
    /// Description.
    pub description: Option<String>,
    /// Tags in the order they were chosen.
    pub tags: Vec<String>,
    /// When the store was created.
    pub created: DateTime<Utc>,
    /// Where it is.
    pub location: Location,
    /// Photo filename under the uploads directory.
    pub photo: Option<String>,
    /// The user who created it.
    pub author: UserId,
}

impl Store {
    /// Whether `user` may edit this store.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.author == user
    }

    /// A draft carrying this store's current values, for updates.
    #[must_use]
    pub fn to_draft(&self) -> StoreDraft {
        StoreDraft {
            id: Some(self.id),
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            created: self.created,
            location: self.location.clone(),
            photo: self.photo.clone(),
            author: self.author,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> StoreInput {
        StoreInput {
            name: "  Coffee House ".into(),
            description: Some("  Great beans  ".into()),
            tags: vec!["Wifi".into(), " ".into(), "Wifi".into(), "Open Late".into()],
            address: Some("12 King St".into()),
            lng: Some(-79.8),
            lat: Some(43.2),
            photo: None,
        }
    }

    #[test]
    fn test_validate_trims_and_dedupes() {
        let fields = input().validate().unwrap();
        assert_eq!(fields.name, "Coffee House");
        assert_eq!(fields.description.as_deref(), Some("Great beans"));
        assert_eq!(fields.tags, vec!["Wifi", "Open Late"]);
        assert_eq!(fields.location.address, "12 King St");
        assert_eq!(fields.location.coordinates, GeoPoint { lng: -79.8, lat: 43.2 });
    }

    #[test]
    fn test_validate_requires_name() {
        let mut i = input();
        i.name = "   ".into();
        assert_eq!(i.validate(), Err(StoreValidationError::MissingName));
    }

    #[test]
    fn test_validate_requires_address() {
        let mut i = input();
        i.address = Some(String::new());
        assert_eq!(i.validate(), Err(StoreValidationError::MissingAddress));
    }

    #[test]
    fn test_validate_requires_both_coordinates() {
        let mut i = input();
        i.lat = None;
        assert_eq!(i.validate(), Err(StoreValidationError::MissingCoordinates));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut i = input();
        i.lat = Some(123.0);
        assert!(matches!(
            i.validate(),
            Err(StoreValidationError::InvalidCoordinates(GeoError::Latitude(_)))
        ));
    }

    #[test]
    fn test_blank_description_becomes_none() {
        let mut i = input();
        i.description = Some("   ".into());
        assert_eq!(i.validate().unwrap().description, None);
    }
}
