//! Domain types for Delicious.
//!
//! Type-safe IDs, a normalized email, GeoJSON-style locations, stores and
//! reviews.

pub mod email;
pub mod geo;
pub mod id;
pub mod review;
pub mod store;

pub use email::{Email, EmailError};
pub use geo::{GeoError, GeoPoint, GeometryKind, Location};
pub use id::*;
pub use review::{Rating, RatingError, Review};
pub use store::{Store, StoreDraft, StoreFields, StoreInput, StoreValidationError};
