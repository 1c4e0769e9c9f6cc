//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use delicious_core::{Email, StoreId, UserId};

/// A site user (domain type).
///
/// Serialized as the body of the heart toggle endpoint, so it never carries
/// the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Stores this user has hearted, oldest first.
    pub hearts: Vec<StoreId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user has hearted `store`.
    #[must_use]
    pub fn has_hearted(&self, store: StoreId) -> bool {
        self.hearts.contains(&store)
    }
}
